pub mod codegen;
pub mod config;
pub mod error;
pub mod undo;

pub use codegen::SplitFields;
pub use config::{LoadMode, StackConfig};
pub use error::EngineError;

use std::path::Path;

use relabel_core::{Command, Env, Label, LabelHash, SessionId, label::label_hash};
use relabel_storage::{FileStorage, SessionMeta, Storage, file::append_suffix};
use tracing::{debug, info, warn};

use crate::undo::CommandLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The command at this log index was reverted or re-applied.
    Applied(usize),
    /// Already at the tail (undo) or head (redo); nothing changed.
    Empty,
}

/// Owns a label sequence and the log of corrections applied to it.
pub struct CorrectionStack {
    labels: Vec<Label>,
    log: CommandLog,
    env: Env,
    storage: FileStorage,
    config: StackConfig,
    identifier: SessionId,
    label_hash: LabelHash,
    /// Cursor as of the last flush or load.
    written: Option<usize>,
    /// Entries in the log file as of the last flush or load.
    durable_len: usize,
    /// Set once a push discards entries the log file still holds.
    log_stale: bool,
}

impl CorrectionStack {
    /// Start a fresh session over `labels`, logging to `path`.
    pub fn new(labels: Vec<Label>, path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::with_config(labels, path, StackConfig::default())
    }

    pub fn with_config(
        labels: Vec<Label>,
        path: impl AsRef<Path>,
        config: StackConfig,
    ) -> Result<Self, EngineError> {
        let label_hash = label_hash(&labels);
        let identifier = SessionId::new();
        let storage = FileStorage::with_sidecar_suffix(path, &config.sidecar_suffix);
        info!(session = %identifier, labels = labels.len(), "new correction session");
        Ok(Self {
            labels,
            log: CommandLog::new(),
            env: Env::standard(),
            storage,
            config,
            identifier,
            label_hash,
            written: None,
            durable_len: 0,
            log_stale: false,
        })
    }

    /// Resume a session from `path`. With `replay` the stored commands are
    /// re-applied to `labels`; without it `labels` are taken as already
    /// corrected.
    pub fn from_file(
        labels: Vec<Label>,
        path: impl AsRef<Path>,
        replay: bool,
    ) -> Result<Self, EngineError> {
        Self::load(labels, path, LoadMode::from_replay(replay), StackConfig::default())
    }

    pub fn load(
        mut labels: Vec<Label>,
        path: impl AsRef<Path>,
        mode: LoadMode,
        config: StackConfig,
    ) -> Result<Self, EngineError> {
        let storage = FileStorage::with_sidecar_suffix(path, &config.sidecar_suffix);
        let commands = storage.read_commands()?;
        let meta = storage.read_meta()?;
        let cursor = meta.resolve_cursor(commands.len())?;

        if config.verify_label_hash && mode.expects_original_labels() {
            let found = label_hash(&labels);
            if found != meta.label_hash {
                warn!(stored = %meta.label_hash, %found, "label hash mismatch");
                return Err(EngineError::LabelHashMismatch {
                    stored: meta.label_hash,
                    found,
                });
            }
        }

        let env = Env::standard();
        let pc = match mode {
            LoadMode::Replay => {
                let end = cursor.map_or(0, |c| c + 1);
                for (index, command) in commands[..end].iter().enumerate() {
                    command
                        .evaluate(&env, &mut labels)
                        .map_err(|source| EngineError::Replay { index, source })?;
                }
                cursor
            }
            LoadMode::AlreadyApplied => cursor,
            LoadMode::Pending => None,
        };

        info!(
            session = %meta.identifier,
            path = %storage.log_path().display(),
            commands = commands.len(),
            ?mode,
            ?pc,
            "loaded correction session"
        );
        let durable_len = commands.len();
        Ok(Self {
            labels,
            log: CommandLog::from_entries(commands, pc),
            env,
            storage,
            config,
            identifier: meta.identifier,
            label_hash: meta.label_hash,
            written: cursor,
            durable_len,
            log_stale: false,
        })
    }

    /// Apply `command` and record it after the cursor, discarding any redo
    /// tail. A command that fails leaves labels and log unchanged.
    pub fn push(&mut self, command: Command) -> Result<usize, EngineError> {
        // Refuse anything the log could not write back out.
        command.to_text()?;
        command.evaluate(&self.env, &mut self.labels)?;

        let kept = self.log.pc().map_or(0, |p| p + 1);
        if kept < self.durable_len {
            self.log_stale = true;
        }
        debug!(op = command.op_name(), "push");
        let index = self.log.push(command);
        Ok(index)
    }

    /// Revert the command at the cursor.
    pub fn undo(&mut self) -> Result<StepResult, EngineError> {
        let Some((index, command)) = self.log.undo_candidate() else {
            return Ok(StepResult::Empty);
        };
        let inverse = command.invert()?;
        inverse.evaluate(&self.env, &mut self.labels)?;
        self.log.step_back();
        debug!(index, op = inverse.op_name(), "undo");
        Ok(StepResult::Applied(index))
    }

    /// Re-apply the command after the cursor.
    pub fn redo(&mut self) -> Result<StepResult, EngineError> {
        let Some((index, command)) = self.log.redo_candidate() else {
            return Ok(StepResult::Empty);
        };
        command.evaluate(&self.env, &mut self.labels)?;
        debug!(index, op = command.op_name(), "redo");
        self.log.step_forward();
        Ok(StepResult::Applied(index))
    }

    /// Redo until the head; returns how many commands were applied.
    pub fn redo_all(&mut self) -> Result<usize, EngineError> {
        let mut applied = 0;
        while let StepResult::Applied(_) = self.redo()? {
            applied += 1;
        }
        Ok(applied)
    }

    pub fn undo_all(&mut self) -> Result<usize, EngineError> {
        let mut reverted = 0;
        while let StepResult::Applied(_) = self.undo()? {
            reverted += 1;
        }
        Ok(reverted)
    }

    /// Stored command at `index`, or `None` outside the log.
    pub fn peek(&self, index: usize) -> Option<&Command> {
        self.log.get(index)
    }

    /// Command at the cursor.
    pub fn current(&self) -> Option<&Command> {
        self.log.current()
    }

    // intents

    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<usize, EngineError> {
        let command = codegen::rename(&self.labels, index, new_name)?;
        self.push(command)
    }

    pub fn set_start(&mut self, index: usize, new_start: f64) -> Result<usize, EngineError> {
        let command = codegen::set_start(&self.labels, index, new_start)?;
        self.push(command)
    }

    pub fn set_stop(&mut self, index: usize, new_stop: f64) -> Result<usize, EngineError> {
        let command = codegen::set_stop(&self.labels, index, new_stop)?;
        self.push(command)
    }

    pub fn merge_next(&mut self, index: usize, new_name: Option<&str>) -> Result<usize, EngineError> {
        let command = codegen::merge_next(&self.labels, index, new_name)?;
        self.push(command)
    }

    pub fn split(
        &mut self,
        index: usize,
        sep: f64,
        new_name: Option<&str>,
        new_next_name: Option<&str>,
    ) -> Result<usize, EngineError> {
        let mut fields = SplitFields::new();
        if let Some(name) = new_name {
            fields = fields.name(name);
        }
        if let Some(name) = new_next_name {
            fields = fields.next_name(name);
        }
        self.split_with(index, sep, fields)
    }

    pub fn split_with(&mut self, index: usize, sep: f64, fields: SplitFields) -> Result<usize, EngineError> {
        let command = codegen::split(&self.labels, index, sep, fields)?;
        self.push(command)
    }

    pub fn delete(&mut self, index: usize) -> Result<usize, EngineError> {
        let command = codegen::delete(&self.labels, index)?;
        self.push(command)
    }

    pub fn create(&mut self, index: usize, label: &Label) -> Result<usize, EngineError> {
        let command = codegen::create(&self.labels, index, label)?;
        self.push(command)
    }

    // persistence

    fn meta(&self) -> SessionMeta {
        SessionMeta::new(self.identifier, self.label_hash).with_cursor(self.log.pc())
    }

    fn write_to(&self, storage: &FileStorage) -> Result<(), EngineError> {
        storage.write_commands(self.log.entries())?;
        storage.write_meta(&self.meta())?;
        Ok(())
    }

    /// Write the whole log and its metadata to the current path.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        self.write_to(&self.storage)?;
        self.written = self.log.pc();
        self.durable_len = self.log.len();
        self.log_stale = false;
        info!(
            path = %self.storage.log_path().display(),
            commands = self.log.len(),
            pc = ?self.written,
            "flushed correction log"
        );
        Ok(())
    }

    /// Write to `path` and make it the session's path from now on.
    pub fn flush_to(&mut self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.storage = FileStorage::with_sidecar_suffix(path, &self.config.sidecar_suffix);
        self.flush()
    }

    /// Write a copy next to the current path without marking it written.
    pub fn write_backup(&self) -> Result<(), EngineError> {
        let path = append_suffix(self.storage.log_path(), &self.config.backup_suffix);
        let backup = FileStorage::with_sidecar_suffix(&path, &self.config.sidecar_suffix);
        self.write_to(&backup)?;
        warn!(path = %path.display(), "wrote correction backup");
        Ok(())
    }

    /// Run `f`, then flush on success or write a backup on failure.
    pub fn transact<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<EngineError>,
    {
        match f(self) {
            Ok(value) => {
                self.flush()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(backup) = self.write_backup() {
                    warn!(error = %backup, "backup after failed transaction also failed");
                }
                Err(e)
            }
        }
    }

    // accessors

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<Label> {
        self.labels
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn pc(&self) -> Option<usize> {
        self.log.pc()
    }

    pub fn written(&self) -> Option<usize> {
        self.written
    }

    /// Whether memory and the log file disagree: the cursor moved since the
    /// last flush, or a push replaced entries the file still holds.
    pub fn is_dirty(&self) -> bool {
        self.log_stale || self.written != self.log.pc()
    }

    pub fn is_at_head(&self) -> bool {
        self.log.is_at_head()
    }

    pub fn is_at_tail(&self) -> bool {
        self.log.is_at_tail()
    }

    pub fn identifier(&self) -> SessionId {
        self.identifier
    }

    pub fn label_hash(&self) -> LabelHash {
        self.label_hash
    }

    pub fn path(&self) -> &Path {
        self.storage.log_path()
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Whether `labels` hash to the sequence this session started from.
    pub fn matches_original(&self, labels: &[Label]) -> bool {
        label_hash(labels) == self.label_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relabel_core::{CoreError, FieldValue};

    fn labels() -> Vec<Label> {
        vec![
            Label::new(1.0, 2.1, "a"),
            Label::new(2.1, 3.5, "b"),
            Label::new(4.7, 5.0, "c"),
        ]
    }

    fn names(stack: &CorrectionStack) -> Vec<&str> {
        stack.labels().iter().filter_map(Label::name).collect()
    }

    fn stack(dir: &tempfile::TempDir) -> Result<CorrectionStack, EngineError> {
        CorrectionStack::new(labels(), dir.path().join("log.txt"))
    }

    #[test]
    fn undo_and_redo_at_bounds_are_no_ops() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        assert_eq!(stack.undo()?, StepResult::Empty);
        assert_eq!(stack.redo()?, StepResult::Empty);

        stack.rename(0, "q")?;
        assert_eq!(stack.redo()?, StepResult::Empty);
        assert_eq!(stack.pc(), Some(0));
        assert_eq!(stack.undo()?, StepResult::Applied(0));
        assert_eq!(stack.undo()?, StepResult::Empty);
        assert!(stack.is_at_tail());
        assert_eq!(names(&stack), ["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn failed_push_changes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        stack.rename(0, "q")?;
        let err = stack.split(2, 1.0, None, None).unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::DomainViolation(_))));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pc(), Some(0));
        assert_eq!(stack.labels()[2], Label::new(4.7, 5.0, "c"));
        Ok(())
    }

    #[test]
    fn unwritable_command_is_refused() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        assert!(stack.rename(0, "say \"hi\"").is_err());
        assert!(stack.is_empty());
        assert_eq!(names(&stack), ["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn dirty_follows_cursor_against_written() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        assert!(!stack.is_dirty());

        stack.rename(0, "q")?;
        assert!(stack.is_dirty());
        stack.flush()?;
        assert!(!stack.is_dirty());
        assert_eq!(stack.written(), Some(0));

        stack.undo()?;
        assert!(stack.is_dirty());
        stack.redo()?;
        assert!(!stack.is_dirty());
        Ok(())
    }

    #[test]
    fn replacing_flushed_entries_stays_dirty_until_flush() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        stack.rename(0, "q")?;
        stack.rename(1, "r")?;
        stack.flush()?;
        stack.undo()?;
        stack.rename(1, "s")?;
        assert!(stack.is_dirty());

        // The cursor is back where the file says, but the file still holds "r".
        stack.undo()?;
        assert_eq!(stack.pc(), Some(0));
        assert_eq!(stack.written(), Some(1));
        assert!(stack.is_dirty());
        assert_eq!(names(&stack), ["q", "b", "c"]);
        let path = dir.path().join("log.txt");
        let on_disk = CorrectionStack::from_file(labels(), &path, true)?;
        assert_eq!(names(&on_disk), ["q", "r", "c"]);

        stack.flush()?;
        assert!(!stack.is_dirty());
        let on_disk = CorrectionStack::from_file(labels(), &path, true)?;
        assert_eq!(names(&on_disk), ["q", "b", "c"]);
        Ok(())
    }

    #[test]
    fn push_over_loaded_entries_is_dirty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        stack.rename(0, "q")?;
        stack.flush()?;

        let corrected = stack.labels().to_vec();
        let path = dir.path().join("log.txt");
        let mut reloaded = CorrectionStack::from_file(corrected, &path, false)?;
        assert!(!reloaded.is_dirty());
        reloaded.undo()?;
        reloaded.rename(0, "z")?;
        assert_eq!(reloaded.pc(), reloaded.written());
        assert!(reloaded.is_dirty());
        Ok(())
    }

    #[test]
    fn flush_writes_log_and_sidecar() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        stack.merge_next(0, Some("ab"))?;
        stack.flush()?;

        let log = std::fs::read_to_string(dir.path().join("log.txt"))?;
        assert!(log.starts_with("(merge-next #:target (interval-pair #:index 0"));
        assert!(log.ends_with(")\n"));
        let sidecar = std::fs::read_to_string(dir.path().join("log.txt.yaml"))?;
        assert!(sidecar.starts_with("# corrections metadata, YAML syntax\n---\n"));
        assert!(sidecar.contains(&stack.identifier().to_string()));
        assert!(sidecar.contains(&stack.label_hash().to_hex()));
        Ok(())
    }

    #[test]
    fn flush_to_repoints_session() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        stack.delete(1)?;
        let other = dir.path().join("other.txt");
        stack.flush_to(&other)?;
        assert_eq!(stack.path(), other.as_path());
        assert!(other.exists());
        assert!(!dir.path().join("log.txt").exists());
        Ok(())
    }

    #[test]
    fn backup_leaves_written_alone() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        stack.rename(2, "z")?;
        stack.write_backup()?;
        assert!(dir.path().join("log.txt.bak").exists());
        assert!(dir.path().join("log.txt.bak.yaml").exists());
        assert!(stack.is_dirty());
        Ok(())
    }

    #[test]
    fn transact_flushes_or_backs_up() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut stack = stack(&dir)?;
        stack.transact(|s| s.rename(0, "q").map(|_| ()))?;
        assert!(!stack.is_dirty());
        assert!(dir.path().join("log.txt").exists());

        let result: Result<(), EngineError> = stack.transact(|s| {
            s.rename(1, "r")?;
            s.delete(9)?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(dir.path().join("log.txt.bak").exists());
        assert_eq!(stack.written(), Some(0));
        assert_eq!(stack.pc(), Some(1));
        Ok(())
    }

    #[test]
    fn replay_restores_corrected_labels() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log.txt");
        let mut stack = CorrectionStack::new(labels(), &path)?;
        stack.rename(0, "q")?;
        stack.merge_next(1, None)?;
        stack.flush()?;
        let corrected = stack.into_labels();

        let replayed = CorrectionStack::from_file(labels(), &path, true)?;
        assert_eq!(replayed.labels(), corrected.as_slice());
        assert_eq!(replayed.pc(), Some(1));
        assert!(!replayed.is_dirty());

        let resumed = CorrectionStack::from_file(corrected.clone(), &path, false)?;
        assert_eq!(resumed.labels(), corrected.as_slice());
        assert_eq!(resumed.pc(), Some(1));
        Ok(())
    }

    #[test]
    fn replay_stops_at_stored_cursor() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log.txt");
        let mut stack = CorrectionStack::new(labels(), &path)?;
        stack.rename(0, "q")?;
        stack.rename(1, "r")?;
        stack.undo()?;
        stack.flush()?;

        let mut replayed = CorrectionStack::from_file(labels(), &path, true)?;
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed.pc(), Some(0));
        assert_eq!(names(&replayed), ["q", "b", "c"]);
        replayed.redo()?;
        assert_eq!(names(&replayed), ["q", "r", "c"]);
        Ok(())
    }

    #[test]
    fn pending_load_applies_nothing_until_redo_all() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log.txt");
        let mut stack = CorrectionStack::new(labels(), &path)?;
        stack.rename(0, "q")?;
        stack.delete(2)?;
        stack.flush()?;

        let mut pending =
            CorrectionStack::load(labels(), &path, LoadMode::Pending, StackConfig::default())?;
        assert!(pending.is_at_tail());
        assert_eq!(names(&pending), ["a", "b", "c"]);
        assert_eq!(pending.redo_all()?, 2);
        assert_eq!(names(&pending), ["q", "b"]);
        assert!(!pending.is_dirty());
        assert_eq!(pending.undo_all()?, 2);
        assert_eq!(names(&pending), ["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn label_hash_is_verified_only_on_request() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log.txt");
        let mut stack = CorrectionStack::new(labels(), &path)?;
        stack.rename(0, "q")?;
        stack.flush()?;

        let mut other = labels();
        other[2].set("name", FieldValue::from("x"));
        assert!(CorrectionStack::from_file(other.clone(), &path, true).is_ok());

        let strict = StackConfig {
            verify_label_hash: true,
            ..StackConfig::default()
        };
        assert!(matches!(
            CorrectionStack::load(other.clone(), &path, LoadMode::Replay, strict.clone()),
            Err(EngineError::LabelHashMismatch { .. })
        ));
        assert!(CorrectionStack::load(labels(), &path, LoadMode::Replay, strict)?.matches_original(&labels()));
        assert!(!stack.matches_original(&other));
        Ok(())
    }

    #[test]
    fn identifier_survives_reload() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log.txt");
        let mut stack = CorrectionStack::new(labels(), &path)?;
        stack.flush()?;
        let reloaded = CorrectionStack::from_file(labels(), &path, true)?;
        assert_eq!(reloaded.identifier(), stack.identifier());
        assert_eq!(reloaded.label_hash(), stack.label_hash());
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.current(), None);
        Ok(())
    }
}
