//! Application-facing proposal objects.
//!
//! These are plain snapshots: they serialize to camelCase JSON and never
//! carry a field the service did not send (or the caller did not set).

use crate::bus::{BusValue, VariantMap};
use crate::{ProposalError, Result};
use serde::{Deserialize, Serialize};

/// A device the proposal may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub label: String,
}

impl From<(String, String)> for Device {
    fn from((id, label): (String, String)) -> Self {
        Device { id, label }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub mount_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_size_limits: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_sizes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots_configurable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots_affect_sizes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_relevant_volumes: Option<Vec<String>>,
}

impl Volume {
    pub fn new(mount_point: impl Into<String>) -> Self {
        Volume {
            mount_point: mount_point.into(),
            ..Default::default()
        }
    }

    pub fn from_variant_map(map: &VariantMap) -> Result<Self> {
        Ok(Volume {
            mount_point: map
                .string("MountPoint")?
                .ok_or_else(|| ProposalError::MissingField("MountPoint".to_string()))?,
            optional: map.bool("Optional")?,
            device_type: map.string("DeviceType")?,
            encrypted: map.bool("Encrypted")?,
            fs_types: map.string_list("FsTypes")?,
            fs_type: map.string("FsType")?,
            min_size: map.int64("MinSize")?,
            max_size: map.int64("MaxSize")?,
            fixed_size_limits: map.bool("FixedSizeLimits")?,
            adaptive_sizes: map.bool("AdaptiveSizes")?,
            snapshots: map.bool("Snapshots")?,
            snapshots_configurable: map.bool("SnapshotsConfigurable")?,
            snapshots_affect_sizes: map.bool("SnapshotsAffectSizes")?,
            size_relevant_volumes: map.string_list("SizeRelevantVolumes")?,
        })
    }

    pub fn to_variant_map(&self) -> VariantMap {
        let mut map = VariantMap::new();
        map.insert("MountPoint", BusValue::Str(self.mount_point.clone()));
        map.insert_opt("Optional", self.optional, BusValue::Bool);
        map.insert_opt("DeviceType", self.device_type.clone(), BusValue::Str);
        map.insert_opt("Encrypted", self.encrypted, BusValue::Bool);
        map.insert_opt("FsTypes", self.fs_types.clone(), BusValue::StrList);
        map.insert_opt("FsType", self.fs_type.clone(), BusValue::Str);
        map.insert_opt("MinSize", self.min_size, BusValue::Int64);
        map.insert_opt("MaxSize", self.max_size, BusValue::Int64);
        map.insert_opt("FixedSizeLimits", self.fixed_size_limits, BusValue::Bool);
        map.insert_opt("AdaptiveSizes", self.adaptive_sizes, BusValue::Bool);
        map.insert_opt("Snapshots", self.snapshots, BusValue::Bool);
        map.insert_opt(
            "SnapshotsConfigurable",
            self.snapshots_configurable,
            BusValue::Bool,
        );
        map.insert_opt(
            "SnapshotsAffectSizes",
            self.snapshots_affect_sizes,
            BusValue::Bool,
        );
        map.insert_opt(
            "SizeRelevantVolumes",
            self.size_relevant_volumes.clone(),
            BusValue::StrList,
        );
        map
    }
}

/// One step the proposal would perform.
///
/// Only `text` is required; flags the service leaves out stay unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subvol: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

impl Action {
    pub fn from_variant_map(map: &VariantMap) -> Result<Self> {
        Ok(Action {
            text: map
                .string("Text")?
                .ok_or_else(|| ProposalError::MissingField("Text".to_string()))?,
            subvol: map.bool("Subvol")?,
            delete: map.bool("Delete")?,
        })
    }
}

/// Snapshot of the service's current proposal.
///
/// `Proposal::default()` is the empty proposal and serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_devices: Option<Vec<Device>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_devices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lvm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
}

impl Proposal {
    pub fn is_empty(&self) -> bool {
        *self == Proposal::default()
    }

    /// Build a proposal from the properties of the proposal object.
    pub fn from_properties(available_devices: Vec<Device>, properties: &VariantMap) -> Result<Self> {
        Ok(Proposal {
            available_devices: Some(available_devices),
            candidate_devices: properties.string_list("CandidateDevices")?,
            lvm: properties.bool("LVM")?,
            encryption_password: properties.string("EncryptionPassword")?,
            volumes: properties
                .map_list("Volumes")?
                .map(|maps| maps.iter().map(Volume::from_variant_map).collect::<Result<Vec<_>>>())
                .transpose()?,
            actions: properties
                .map_list("Actions")?
                .map(|maps| maps.iter().map(Action::from_variant_map).collect::<Result<Vec<_>>>())
                .transpose()?,
        })
    }
}

/// Constraints for a new proposal calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_devices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lvm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,
}

impl ProposalSettings {
    pub fn to_variant_map(&self) -> VariantMap {
        let mut map = VariantMap::new();
        map.insert_opt(
            "CandidateDevices",
            self.candidate_devices.clone(),
            BusValue::StrList,
        );
        map.insert_opt(
            "EncryptionPassword",
            self.encryption_password.clone(),
            BusValue::Str,
        );
        map.insert_opt("LVM", self.lvm, BusValue::Bool);
        map.insert_opt(
            "Volumes",
            self.volumes
                .as_ref()
                .map(|volumes| volumes.iter().map(Volume::to_variant_map).collect::<Vec<_>>()),
            BusValue::MapList,
        );
        map
    }
}
