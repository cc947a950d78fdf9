use relabel_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: CoreError,
    },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}
