use std::fs;
use std::path::{Path, PathBuf};

use relabel_core::Command;
use tracing::debug;

use crate::error::StorageError;
use crate::schema::{DEFAULT_SIDECAR_SUFFIX, SessionMeta};
use crate::traits::Storage;

/// Command log as one command per line, with metadata in a sidecar file
/// named by appending a suffix to the log path.
#[derive(Debug, Clone)]
pub struct FileStorage {
    log_path: PathBuf,
    sidecar_path: PathBuf,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_sidecar_suffix(path, DEFAULT_SIDECAR_SUFFIX)
    }

    pub fn with_sidecar_suffix(path: impl AsRef<Path>, suffix: &str) -> Self {
        let log_path = path.as_ref().to_path_buf();
        let sidecar_path = append_suffix(&log_path, suffix);
        Self {
            log_path,
            sidecar_path,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }
}

/// `file.txt` + `.yaml` is `file.txt.yaml`.
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

impl Storage for FileStorage {
    fn read_commands(&self) -> Result<Vec<Command>, StorageError> {
        let text = fs::read_to_string(&self.log_path)?;
        let mut commands = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let command = Command::parse(line).map_err(|source| StorageError::Parse {
                line: n + 1,
                source,
            })?;
            commands.push(command);
        }
        debug!(path = %self.log_path.display(), count = commands.len(), "read command log");
        Ok(commands)
    }

    fn write_commands(&self, commands: &[Command]) -> Result<(), StorageError> {
        let mut text = String::new();
        for command in commands {
            text.push_str(&command.to_text()?);
            text.push('\n');
        }
        fs::write(&self.log_path, text)?;
        debug!(path = %self.log_path.display(), count = commands.len(), "wrote command log");
        Ok(())
    }

    fn read_meta(&self) -> Result<SessionMeta, StorageError> {
        let text = fs::read_to_string(&self.sidecar_path)?;
        SessionMeta::from_yaml(&text)
    }

    fn write_meta(&self, meta: &SessionMeta) -> Result<(), StorageError> {
        fs::write(&self.sidecar_path, meta.to_yaml()?)?;
        Ok(())
    }
}
