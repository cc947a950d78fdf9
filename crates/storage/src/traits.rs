use relabel_core::Command;

use crate::error::StorageError;
use crate::schema::SessionMeta;

/// Durable home of a command log and its session metadata.
///
/// Writes replace the whole stored log; there is no incremental append.
pub trait Storage {
    fn read_commands(&self) -> Result<Vec<Command>, StorageError>;

    fn write_commands(&self, commands: &[Command]) -> Result<(), StorageError>;

    fn read_meta(&self) -> Result<SessionMeta, StorageError>;

    fn write_meta(&self, meta: &SessionMeta) -> Result<(), StorageError>;
}
