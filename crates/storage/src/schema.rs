//! Sidecar metadata stored next to a command log.

use relabel_core::{LabelHash, SessionId};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

pub const DEFAULT_SIDECAR_SUFFIX: &str = ".yaml";

const METADATA_HEADER: &str = "# corrections metadata, YAML syntax\n---\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub identifier: SessionId,
    pub label_hash: LabelHash,
    /// Index of the last applied command when flushed; -1 means none.
    /// Older sidecars omit it, which reads as "every entry applied".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<i64>,
}

impl SessionMeta {
    pub fn new(identifier: SessionId, label_hash: LabelHash) -> Self {
        Self {
            identifier,
            label_hash,
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = Some(cursor.map_or(-1, |c| c as i64));
        self
    }

    /// Cursor against a log of `len` entries; `None` is the tail.
    pub fn resolve_cursor(&self, len: usize) -> Result<Option<usize>, StorageError> {
        match self.cursor {
            None => Ok(len.checked_sub(1)),
            Some(-1) => Ok(None),
            Some(c) if c >= 0 && (c as usize) < len => Ok(Some(c as usize)),
            Some(c) => Err(StorageError::InvalidMetadata(format!(
                "cursor {c} outside log of {len} entries"
            ))),
        }
    }

    pub fn to_yaml(&self) -> Result<String, StorageError> {
        Ok(format!("{METADATA_HEADER}{}", serde_yaml::to_string(self)?))
    }

    pub fn from_yaml(text: &str) -> Result<Self, StorageError> {
        Ok(serde_yaml::from_str(text)?)
    }
}
