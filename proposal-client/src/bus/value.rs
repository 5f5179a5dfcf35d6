//! Typed bus values.
//!
//! `BusValue` is the closed set of variant types the storage service uses in
//! its `a{sv}` property maps. It converts to and from `zvariant::Value` for
//! the wire, and serializes to the self-describing `{"t": tag, "v": value}`
//! form used by the UI bridge.

use crate::{ProposalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};
use zvariant::{OwnedValue, Value};

/// A single type-tagged bus value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum BusValue {
    #[serde(rename = "s")]
    Str(String),

    #[serde(rename = "b")]
    Bool(bool),

    #[serde(rename = "x")]
    Int64(i64),

    #[serde(rename = "as")]
    StrList(Vec<String>),

    #[serde(rename = "aa{sv}")]
    MapList(Vec<VariantMap>),
}

impl BusValue {
    /// D-Bus signature of the value.
    pub fn tag(&self) -> &'static str {
        match self {
            BusValue::Str(_) => "s",
            BusValue::Bool(_) => "b",
            BusValue::Int64(_) => "x",
            BusValue::StrList(_) => "as",
            BusValue::MapList(_) => "aa{sv}",
        }
    }

    /// Strip the type tags, recursively.
    pub fn into_plain(self) -> serde_json::Value {
        match self {
            BusValue::Str(s) => serde_json::Value::String(s),
            BusValue::Bool(b) => serde_json::Value::Bool(b),
            BusValue::Int64(n) => serde_json::Value::from(n),
            BusValue::StrList(items) => serde_json::Value::from(items),
            BusValue::MapList(maps) => {
                serde_json::Value::Array(maps.into_iter().map(VariantMap::into_plain).collect())
            }
        }
    }
}

/// String-keyed map of typed values (`a{sv}` on the bus).
///
/// Keys are kept sorted so logs and JSON output are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantMap(BTreeMap<String, BusValue>);

impl VariantMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: BusValue) {
        self.0.insert(key.into(), value);
    }

    /// Insert only when a value is present.
    pub fn insert_opt<T>(&mut self, key: &str, value: Option<T>, wrap: impl FnOnce(T) -> BusValue) {
        if let Some(value) = value {
            self.insert(key, wrap(value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&BusValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(BusValue::Str(s)) => Ok(Some(s.clone())),
            Some(other) => Err(mismatch(key, "s", other)),
        }
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(BusValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(key, "b", other)),
        }
    }

    pub fn int64(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(BusValue::Int64(n)) => Ok(Some(*n)),
            Some(other) => Err(mismatch(key, "x", other)),
        }
    }

    pub fn string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.get(key) {
            None => Ok(None),
            Some(BusValue::StrList(items)) => Ok(Some(items.clone())),
            Some(other) => Err(mismatch(key, "as", other)),
        }
    }

    pub fn map_list(&self, key: &str) -> Result<Option<&[VariantMap]>> {
        match self.get(key) {
            None => Ok(None),
            Some(BusValue::MapList(maps)) => Ok(Some(maps)),
            Some(other) => Err(mismatch(key, "aa{sv}", other)),
        }
    }

    pub fn into_plain(self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .into_iter()
                .map(|(k, v)| (k, v.into_plain()))
                .collect(),
        )
    }

    /// Convert a property map as returned by `GetAll`.
    ///
    /// Entries whose signature has no `BusValue` counterpart are skipped,
    /// here and inside nested maps, so one unknown key never hides a whole
    /// property.
    pub fn from_owned_lossy(properties: &HashMap<String, OwnedValue>) -> Self {
        let mut map = VariantMap::new();
        for (key, value) in properties {
            match BusValue::try_from(&**value) {
                Ok(value) => map.insert(key.clone(), value),
                Err(e) => debug!("Skipping property {}: {}", key, e),
            }
        }
        map
    }

    /// Wire form for method arguments.
    pub fn to_dict(&self) -> HashMap<String, Value<'static>> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect()
    }
}

impl FromIterator<(String, BusValue)> for VariantMap {
    fn from_iter<I: IntoIterator<Item = (String, BusValue)>>(iter: I) -> Self {
        VariantMap(iter.into_iter().collect())
    }
}

fn mismatch(key: &str, expected: &'static str, found: &BusValue) -> ProposalError {
    ProposalError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.tag(),
    }
}

impl From<BusValue> for Value<'static> {
    fn from(value: BusValue) -> Self {
        match value {
            BusValue::Str(s) => Value::from(s),
            BusValue::Bool(b) => Value::from(b),
            BusValue::Int64(n) => Value::from(n),
            BusValue::StrList(items) => Value::from(items),
            BusValue::MapList(maps) => Value::from(
                maps.iter()
                    .map(VariantMap::to_dict)
                    .collect::<Vec<HashMap<String, Value<'static>>>>(),
            ),
        }
    }
}

impl<'a> TryFrom<&Value<'a>> for BusValue {
    type Error = ProposalError;

    fn try_from(value: &Value<'a>) -> Result<Self> {
        match value {
            Value::Value(inner) => BusValue::try_from(&**inner),
            Value::Str(s) => Ok(BusValue::Str(s.to_string())),
            Value::Bool(b) => Ok(BusValue::Bool(*b)),
            Value::I64(n) => Ok(BusValue::Int64(*n)),
            Value::Array(array) => match array.element_signature().as_str() {
                // `av` is how typed string lists arrive inside volume maps
                "s" | "v" => array
                    .iter()
                    .map(|item| match BusValue::try_from(item)? {
                        BusValue::Str(s) => Ok(s),
                        other => Err(ProposalError::UnsupportedSignature(format!(
                            "av of {}",
                            other.tag()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(BusValue::StrList),
                "a{sv}" => array
                    .iter()
                    .map(variant_map_from_value)
                    .collect::<Result<Vec<_>>>()
                    .map(BusValue::MapList),
                other => Err(ProposalError::UnsupportedSignature(format!("a{}", other))),
            },
            other => Err(ProposalError::UnsupportedSignature(
                other.value_signature().to_string(),
            )),
        }
    }
}

fn variant_map_from_value(value: &Value<'_>) -> Result<VariantMap> {
    match value {
        Value::Value(inner) => variant_map_from_value(inner),
        Value::Dict(dict) => {
            let mut entries = Vec::new();
            for (key, value) in dict.iter() {
                let Value::Str(key) = key else {
                    return Err(ProposalError::UnsupportedSignature(format!(
                        "dict key {}",
                        key.value_signature()
                    )));
                };
                match BusValue::try_from(value) {
                    Ok(value) => entries.push((key.to_string(), value)),
                    Err(ProposalError::UnsupportedSignature(sig)) => {
                        warn!("Skipping nested key {} with signature {}", key, sig)
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(entries.into_iter().collect())
        }
        other => Err(ProposalError::UnsupportedSignature(
            other.value_signature().to_string(),
        )),
    }
}
