// Configuration for the control plane
//
// Stored as JSON. Every field has a default so partial files load.

use crate::protocol::{current_supported_versions, ProtocolVersionList, VersionError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid supported versions: {0}")]
    InvalidVersions(#[from] VersionError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// Versions this process advertises, e.g. `"1.3"` or `"1.3,2.0"`
    pub supported_versions: String,

    /// Seconds between keepalive frames on event streams (0 = disabled)
    pub heartbeat_interval_secs: u64,

    /// Per-connection event queue size
    pub event_queue_capacity: usize,

    /// sled directory for audit entries (None = in-memory)
    pub audit_store_path: Option<String>,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            supported_versions: current_supported_versions().to_string(),
            heartbeat_interval_secs: 15,
            event_queue_capacity: 64,
            audit_store_path: None,
        }
    }
}

impl ControlPlaneConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ControlPlaneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.supported_version_list()?;
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn supported_version_list(&self) -> Result<ProtocolVersionList, VersionError> {
        ProtocolVersionList::parse(&self.supported_versions)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        match self.heartbeat_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
