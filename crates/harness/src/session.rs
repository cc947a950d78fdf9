use std::path::PathBuf;

use relabel_core::Label;
use relabel_engine::{CorrectionStack, EngineError, LoadMode, StackConfig};
use tempfile::TempDir;

/// Two adjacent intervals and one detached interval.
pub fn sample_labels() -> Vec<Label> {
    vec![
        Label::new(1.0, 2.1, "a"),
        Label::new(2.1, 3.5, "b"),
        Label::new(4.7, 5.0, "c"),
    ]
}

/// Labels carrying an extra `tier` field.
pub fn tiered_labels() -> Vec<Label> {
    vec![
        Label::new(1.0, 2.1, "a").with_field("tier", "female"),
        Label::new(2.1, 3.5, "b").with_field("tier", "male"),
        Label::new(4.7, 5.0, "c").with_field("tier", "female"),
    ]
}

pub fn split_fixture() -> Vec<Label> {
    vec![Label::new(4.7, 5.0, "c")]
}

/// A correction stack logging into its own temporary directory.
pub struct TestSession {
    pub dir: TempDir,
    pub stack: CorrectionStack,
}

impl TestSession {
    pub fn new(labels: Vec<Label>) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(labels, StackConfig::default())
    }

    pub fn with_config(
        labels: Vec<Label>,
        config: StackConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        crate::init_tracing();
        let dir = tempfile::tempdir()?;
        let stack = CorrectionStack::with_config(labels, dir.path().join("corrections.txt"), config)?;
        Ok(Self { dir, stack })
    }

    pub fn log_path(&self) -> PathBuf {
        self.stack.path().to_path_buf()
    }

    /// Open a second stack over the same files.
    pub fn reload(&self, labels: Vec<Label>, mode: LoadMode) -> Result<CorrectionStack, EngineError> {
        CorrectionStack::load(labels, self.log_path(), mode, self.stack.config().clone())
    }
}
