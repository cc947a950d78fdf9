use serde::Deserialize;

use crate::error::EngineError;

/// Settings for a correction session. Every field has a default, so an
/// empty YAML document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Appended to the log path to name the metadata file.
    pub sidecar_suffix: String,
    /// Appended to the log path to name the backup written on failure.
    pub backup_suffix: String,
    /// Compare caller-supplied labels against the stored hash on load.
    pub verify_label_hash: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            sidecar_suffix: relabel_storage::schema::DEFAULT_SIDECAR_SUFFIX.to_string(),
            backup_suffix: ".bak".to_string(),
            verify_label_hash: false,
        }
    }
}

impl StackConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, EngineError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

/// How a stored log relates to the labels handed to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Labels are the originals; re-apply every command up to the cursor.
    Replay,
    /// Labels already carry the corrections; only restore the cursor.
    AlreadyApplied,
    /// Labels are the originals; start at the tail and apply nothing.
    Pending,
}

impl LoadMode {
    pub fn from_replay(replay: bool) -> Self {
        if replay { Self::Replay } else { Self::AlreadyApplied }
    }

    /// Whether the labels are expected to hash to the stored value.
    pub fn expects_original_labels(&self) -> bool {
        matches!(self, Self::Replay | Self::Pending)
    }
}
