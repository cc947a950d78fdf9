//! Builders for the forward commands behind each intent.
//!
//! Every generator snapshots the pre-state it needs into `#:target` so the
//! resulting command can be inverted without looking at the labels again.

use relabel_core::label::{NAME, START, STOP};
use relabel_core::{Atom, Command, CommandBuilder, CoreError, FieldValue, Label, Primitive, RecordKind};

fn label_at(labels: &[Label], index: usize) -> Result<&Label, CoreError> {
    labels.get(index).ok_or(CoreError::Index {
        index,
        len: labels.len(),
    })
}

fn field<'a>(label: &'a Label, index: usize, name: &str) -> Result<&'a FieldValue, CoreError> {
    label.get(name).ok_or_else(|| CoreError::MissingField {
        index,
        field: name.to_string(),
    })
}

fn text_field<'a>(label: &'a Label, index: usize, name: &str) -> Result<&'a str, CoreError> {
    let value = field(label, index, name)?;
    value.as_text().ok_or_else(|| CoreError::TypeMismatch {
        expected: "string",
        found: value.type_name().to_string(),
    })
}

fn set_field(
    labels: &[Label],
    op: Primitive,
    index: usize,
    name: &str,
    value: Atom,
) -> Result<Command, CoreError> {
    let label = label_at(labels, index)?;
    let current = field(label, index, name)?;
    Ok(CommandBuilder::new(op, RecordKind::Interval, index)
        .target(name, current)
        .arg(&format!("new_{name}"), value)
        .build())
}

pub fn rename(labels: &[Label], index: usize, new_name: &str) -> Result<Command, CoreError> {
    set_field(labels, Primitive::SetName, index, NAME, Atom::from(new_name))
}

pub fn set_start(labels: &[Label], index: usize, new_start: f64) -> Result<Command, CoreError> {
    set_field(labels, Primitive::SetStart, index, START, Atom::Float(new_start))
}

pub fn set_stop(labels: &[Label], index: usize, new_stop: f64) -> Result<Command, CoreError> {
    set_field(labels, Primitive::SetStop, index, STOP, Atom::Float(new_stop))
}

/// Merge `index` with its successor. The name defaults to both names
/// concatenated.
pub fn merge_next(labels: &[Label], index: usize, new_name: Option<&str>) -> Result<Command, CoreError> {
    let first = label_at(labels, index)?;
    let second = label_at(labels, index + 1)?;
    let name = text_field(first, index, NAME)?;
    let next_name = text_field(second, index + 1, NAME)?;
    let new_name = match new_name {
        Some(n) => n.to_string(),
        None => format!("{name}{next_name}"),
    };

    let mut builder = CommandBuilder::new(Primitive::MergeNext, RecordKind::IntervalPair, index)
        .target(NAME, name)
        .target(STOP, field(first, index, STOP)?)
        .target("next_start", field(second, index + 1, START)?)
        .target("next_name", next_name)
        .arg("new_name", new_name.as_str())
        .arg("new_stop", Atom::Null)
        .arg("new_next_start", Atom::Null)
        .arg("new_next_name", Atom::Null);
    // The survivor keeps its own extras, so those are only snapshotted. The
    // successor's extras are recorded so the inverse split rebuilds it with
    // exactly the fields it had.
    for (key, value) in first.extra_fields() {
        builder = builder.target(key, value);
    }
    for (key, value) in second.extra_fields() {
        builder = builder
            .target(&format!("next_{key}"), value)
            .arg(&format!("new_next_{key}"), Atom::Null);
    }
    Ok(builder.build())
}

/// Values for the two halves of a split. Unset names fall back to the
/// original name and the empty string; unset extra fields are inherited
/// by both halves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitFields {
    name: Option<String>,
    next_name: Option<String>,
    fields: Vec<(String, FieldValue)>,
    next_fields: Vec<(String, FieldValue)>,
}

impl SplitFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn next_name(mut self, name: &str) -> Self {
        self.next_name = Some(name.to_string());
        self
    }

    /// Extra-field value for the first half.
    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// Extra-field value for the second half.
    pub fn next_field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.next_fields.push((key.to_string(), value.into()));
        self
    }
}

fn lookup<'a>(fields: &'a [(String, FieldValue)], key: &str) -> Option<&'a FieldValue> {
    fields.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
}

pub fn split(labels: &[Label], index: usize, sep: f64, fields: SplitFields) -> Result<Command, CoreError> {
    let label = label_at(labels, index)?;
    let name = text_field(label, index, NAME)?;
    for (key, _) in fields.fields.iter().chain(&fields.next_fields) {
        if !label.contains(key) {
            return Err(CoreError::MissingField {
                index,
                field: key.clone(),
            });
        }
    }
    let new_name = fields.name.clone().unwrap_or_else(|| name.to_string());
    let new_next_name = fields.next_name.clone().unwrap_or_default();

    let mut builder = CommandBuilder::new(Primitive::Split, RecordKind::IntervalPair, index)
        .target(NAME, name)
        .target(STOP, field(label, index, STOP)?)
        .target("next_name", Atom::Null)
        .target("next_start", Atom::Null)
        .arg("new_name", new_name.as_str())
        .arg("new_stop", Atom::Float(sep))
        .arg("new_next_start", Atom::Float(sep))
        .arg("new_next_name", new_next_name.as_str());
    for (key, value) in label.extra_fields() {
        let first = lookup(&fields.fields, key).unwrap_or(value);
        let second = lookup(&fields.next_fields, key).unwrap_or(value);
        builder = builder
            .target(key, value)
            .target(&format!("next_{key}"), Atom::Null)
            .arg(&format!("new_{key}"), first)
            .arg(&format!("new_next_{key}"), second);
    }
    Ok(builder.build())
}

/// Snapshot the whole record so the inverse `create` restores it.
pub fn delete(labels: &[Label], index: usize) -> Result<Command, CoreError> {
    let label = label_at(labels, index)?;
    let mut builder = CommandBuilder::new(Primitive::Delete, RecordKind::Interval, index);
    for (key, value) in label.fields() {
        builder = builder.target(key, value);
    }
    Ok(builder.build())
}

pub fn create(labels: &[Label], index: usize, label: &Label) -> Result<Command, CoreError> {
    if index > labels.len() {
        return Err(CoreError::Index {
            index,
            len: labels.len(),
        });
    }
    for required in [START, STOP, NAME] {
        field(label, index, required)?;
    }
    let mut builder = CommandBuilder::new(Primitive::Create, RecordKind::Interval, index);
    for (key, value) in label.fields() {
        builder = builder.target(key, value);
    }
    Ok(builder.build())
}
