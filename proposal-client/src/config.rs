//! Configuration management for the proposal client.
//!
//! Loads configuration from a TOML file. Every section and key is optional;
//! missing values fall back to the defaults of the storage service.

use crate::{ProposalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bus: BusConfig,
    pub service: ServiceConfig,
    pub log: LogConfig,
}

/// Which message bus to connect to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Well-known bus to use when no address is given
    pub kind: BusKind,

    /// Explicit bus address (e.g. `unix:path=/run/dbus/system_bus_socket`)
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Well-known name of the storage service
    pub name: String,

    /// Object path exporting the calculator interface
    pub calculator_path: String,

    pub calculator_interface: String,

    /// Object path of the current proposal
    pub proposal_path: String,

    pub proposal_interface: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            name: "org.opensuse.DInstaller.Storage".to_string(),
            calculator_path: "/org/opensuse/DInstaller/Storage1".to_string(),
            calculator_interface: "org.opensuse.DInstaller.Storage.Proposal.Calculator1"
                .to_string(),
            proposal_path: "/org/opensuse/DInstaller/Storage/Proposal1".to_string(),
            proposal_interface: "org.opensuse.DInstaller.Storage.Proposal1".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ProposalError::Config(format!("{}: {}", path.display(), e)))
    }
}
