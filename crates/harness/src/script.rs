//! Seeded random edit scripts.
//!
//! Generated edits are always valid against the labels they were drawn
//! for, so any failure while applying one is a real defect.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relabel_core::{Command, Label};
use relabel_engine::{CorrectionStack, EngineError, SplitFields, codegen};

const NAMES: [&str; 6] = ["a", "b", "sil", "focus bird", "", "x_y"];
const TIERS: [&str; 3] = ["female", "male", "unknown"];
const NOTES: [&str; 3] = ["overlap", "check", "noisy"];

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Rename { index: usize, name: String },
    SetStart { index: usize, start: f64 },
    SetStop { index: usize, stop: f64 },
    MergeNext { index: usize, name: Option<String> },
    Split { index: usize, sep: f64, fields: SplitFields },
    Delete { index: usize },
    Create { index: usize, label: Label },
}

impl Edit {
    /// The forward command this edit would push.
    pub fn command(&self, labels: &[Label]) -> Result<Command, EngineError> {
        let command = match self {
            Edit::Rename { index, name } => codegen::rename(labels, *index, name)?,
            Edit::SetStart { index, start } => codegen::set_start(labels, *index, *start)?,
            Edit::SetStop { index, stop } => codegen::set_stop(labels, *index, *stop)?,
            Edit::MergeNext { index, name } => codegen::merge_next(labels, *index, name.as_deref())?,
            Edit::Split { index, sep, fields } => codegen::split(labels, *index, *sep, fields.clone())?,
            Edit::Delete { index } => codegen::delete(labels, *index)?,
            Edit::Create { index, label } => codegen::create(labels, *index, label)?,
        };
        Ok(command)
    }

    pub fn apply(&self, stack: &mut CorrectionStack) -> Result<usize, EngineError> {
        let command = self.command(stack.labels())?;
        stack.push(command)
    }
}

fn millis(time: Option<f64>) -> i64 {
    (time.unwrap_or(0.0) * 1000.0).round() as i64
}

/// Draws edits that keep every label's start before its stop, so each
/// generated command and its inverse always apply.
pub struct EditScript {
    rng: StdRng,
}

impl EditScript {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A time in `[low, high)`, both given in milliseconds.
    fn time(&mut self, low: i64, high: i64) -> f64 {
        let ms = if high > low { self.rng.gen_range(low..high) } else { low };
        ms as f64 / 1000.0
    }

    fn name(&mut self) -> String {
        NAMES[self.rng.gen_range(0..NAMES.len())].to_string()
    }

    fn label(&mut self, tiered: bool) -> Label {
        let start: i64 = self.rng.gen_range(0..10_000);
        let stop = start + self.rng.gen_range(100..2_000);
        let mut label = Label::new(start as f64 / 1000.0, stop as f64 / 1000.0, &self.name());
        if tiered {
            label = label.with_field("tier", TIERS[self.rng.gen_range(0..TIERS.len())]);
        }
        // Only some labels carry a note, so neighbours differ in their fields.
        if self.rng.gen_bool(0.3) {
            label = label.with_field("note", NOTES[self.rng.gen_range(0..NOTES.len())]);
        }
        label
    }

    /// Draw one edit that is valid for `labels`.
    pub fn next_edit(&mut self, labels: &[Label]) -> Edit {
        let tiered = labels.first().is_some_and(|l| l.contains("tier"));
        if labels.is_empty() {
            return Edit::Create {
                index: 0,
                label: self.label(tiered),
            };
        }
        let index = self.rng.gen_range(0..labels.len());
        let label = &labels[index];
        let start = millis(label.start());
        let stop = millis(label.stop());
        let next_stop = labels.get(index + 1).map(|l| millis(l.stop()));
        match self.rng.gen_range(0..7) {
            0 => Edit::SetStart {
                index,
                start: self.time(start - 500, stop),
            },
            1 => Edit::SetStop {
                index,
                stop: self.time(start + 1, stop + 501),
            },
            2 if next_stop.is_some_and(|s| s > start) => Edit::MergeNext {
                index,
                name: self.rng.gen_bool(0.5).then(|| self.name()),
            },
            3 if stop - start >= 2 => {
                let sep = self.time(start + 1, stop);
                let mut fields = SplitFields::new().next_name(&self.name());
                if tiered && self.rng.gen_bool(0.5) {
                    fields = fields.next_field("tier", TIERS[self.rng.gen_range(0..TIERS.len())]);
                }
                Edit::Split { index, sep, fields }
            }
            4 if labels.len() > 1 => Edit::Delete { index },
            5 => Edit::Create {
                index: self.rng.gen_range(0..=labels.len()),
                label: self.label(tiered),
            },
            _ => Edit::Rename {
                index,
                name: self.name(),
            },
        }
    }

    /// Push `steps` random edits onto `stack`.
    pub fn run(&mut self, stack: &mut CorrectionStack, steps: usize) -> Result<Vec<Edit>, EngineError> {
        let mut edits = Vec::with_capacity(steps);
        for _ in 0..steps {
            let edit = self.next_edit(stack.labels());
            edit.apply(stack)?;
            edits.push(edit);
        }
        Ok(edits)
    }
}
