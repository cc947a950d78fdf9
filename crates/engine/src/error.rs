use relabel_core::{CoreError, LabelHash};
use relabel_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("replaying command {index}: {source}")]
    Replay {
        index: usize,
        #[source]
        source: CoreError,
    },

    #[error("labels do not match the session's original labels: stored {stored}, found {found}")]
    LabelHashMismatch { stored: LabelHash, found: LabelHash },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl From<relabel_core::SyntaxError> for EngineError {
    fn from(e: relabel_core::SyntaxError) -> Self {
        EngineError::Core(CoreError::Syntax(e))
    }
}
