use crate::error::CoreError;
use crate::eval::{Kwargs, Value};
use crate::field_value::FieldValue;
use crate::label::{CORE_FIELDS, Label, NAME, STOP};

/// The fixed vocabulary of label-mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    SetName,
    SetStart,
    SetStop,
    MergeNext,
    Split,
    Delete,
    Create,
}

impl Primitive {
    pub const ALL: [Primitive; 7] = [
        Self::SetName,
        Self::SetStart,
        Self::SetStop,
        Self::MergeNext,
        Self::Split,
        Self::Delete,
        Self::Create,
    ];

    /// Canonical (underscore) name as bound in the standard environment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetName => "set_name",
            Self::SetStart => "set_start",
            Self::SetStop => "set_stop",
            Self::MergeNext => "merge_next",
            Self::Split => "split",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// The operation that undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            Self::SetName => Self::SetName,
            Self::SetStart => Self::SetStart,
            Self::SetStop => Self::SetStop,
            Self::MergeNext => Self::Split,
            Self::Split => Self::MergeNext,
            Self::Delete => Self::Create,
            Self::Create => Self::Delete,
        }
    }

    /// Field written by the `set_*` operations.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::SetName => Some("name"),
            Self::SetStart => Some("start"),
            Self::SetStop => Some("stop"),
            _ => None,
        }
    }

    /// Run against `labels`. Every check happens before the first write, so
    /// an error leaves the sequence untouched.
    pub fn apply(&self, labels: &mut Vec<Label>, kwargs: &Kwargs) -> Result<(), CoreError> {
        let target = Target::from_kwargs(kwargs)?;
        match self {
            Self::SetName | Self::SetStart | Self::SetStop => {
                let field = self.field().unwrap_or(NAME);
                set_field(labels, &target, field, kwargs)
            }
            Self::MergeNext => merge_next(labels, &target, kwargs),
            Self::Split => split(labels, &target, kwargs),
            Self::Delete => delete(labels, &target),
            Self::Create => create(labels, &target),
        }
    }
}

/// The `#:target` record: an index plus pre-state fields.
struct Target<'a> {
    index: usize,
    fields: &'a Kwargs,
}

impl<'a> Target<'a> {
    fn from_kwargs(kwargs: &'a Kwargs) -> Result<Self, CoreError> {
        let record = match kwargs.require("target")? {
            Value::Record(record) => record,
            other => {
                return Err(CoreError::TypeMismatch {
                    expected: "record",
                    found: other.type_name().to_string(),
                });
            }
        };
        let index = match record.fields.get("index") {
            Some(Value::Integer(n)) if *n >= 0 => *n as usize,
            Some(other) => {
                return Err(CoreError::TypeMismatch {
                    expected: "non-negative integer index",
                    found: format!("{other:?}"),
                });
            }
            None => return Err(CoreError::ArityOrName("target has no index".to_string())),
        };
        Ok(Self {
            index,
            fields: &record.fields,
        })
    }
}

fn out_of_range(index: usize, labels: &[Label]) -> CoreError {
    CoreError::Index {
        index,
        len: labels.len(),
    }
}

fn required_number(kwargs: &Kwargs, name: &str) -> Result<f64, CoreError> {
    let value = kwargs.require(name)?;
    value.as_f64().ok_or_else(|| CoreError::TypeMismatch {
        expected: "number",
        found: format!("{name} = {value:?}"),
    })
}

fn bound(label: &Label, index: usize, field: &str) -> Result<f64, CoreError> {
    let value = label.get(field).ok_or_else(|| CoreError::MissingField {
        index,
        field: field.to_string(),
    })?;
    value.as_f64().ok_or_else(|| CoreError::TypeMismatch {
        expected: "numeric bound",
        found: value.type_name().to_string(),
    })
}

fn set_field(
    labels: &mut [Label],
    target: &Target<'_>,
    field: &str,
    kwargs: &Kwargs,
) -> Result<(), CoreError> {
    let value = kwargs.require(&format!("new_{field}"))?.to_field_value()?;
    let index = target.index;
    let len = labels.len();
    let Some(label) = labels.get_mut(index) else {
        return Err(CoreError::Index { index, len });
    };
    if !label.contains(field) {
        return Err(CoreError::MissingField {
            index,
            field: field.to_string(),
        });
    }
    label.set(field, value);
    Ok(())
}

fn merge_next(labels: &mut Vec<Label>, target: &Target<'_>, kwargs: &Kwargs) -> Result<(), CoreError> {
    let index = target.index;
    if index + 1 >= labels.len() {
        return Err(out_of_range(index + 1, labels));
    }
    let new_name = kwargs.require("new_name")?.to_field_value()?;
    let successor_stop = labels[index + 1]
        .get(STOP)
        .cloned()
        .ok_or_else(|| CoreError::MissingField {
            index: index + 1,
            field: STOP.to_string(),
        })?;

    // Extra-field values are written to the survivor, nulls included, so
    // the undo of a split restores the fields it rewrote.
    let mut extras = Vec::new();
    for (key, value) in kwargs.iter() {
        let Some(field) = key.strip_prefix("new_") else {
            continue;
        };
        if field.starts_with("next_") || CORE_FIELDS.contains(&field) {
            continue;
        }
        extras.push((field.to_string(), value.to_field_value()?));
    }

    let survivor = &mut labels[index];
    survivor.set(STOP, successor_stop);
    survivor.set(NAME, new_name);
    for (field, value) in extras {
        survivor.set(&field, value);
    }
    labels.remove(index + 1);
    Ok(())
}

fn split(labels: &mut Vec<Label>, target: &Target<'_>, kwargs: &Kwargs) -> Result<(), CoreError> {
    let index = target.index;
    let original = labels.get(index).ok_or_else(|| out_of_range(index, labels))?;
    let start = bound(original, index, "start")?;
    let stop = bound(original, index, STOP)?;
    let new_stop = required_number(kwargs, "new_stop")?;
    let new_next_start = required_number(kwargs, "new_next_start")?;
    if !(new_stop > start) {
        return Err(CoreError::DomainViolation(format!(
            "new stop {new_stop} is not after start {start} of label {index}"
        )));
    }
    if !(new_next_start < stop) {
        return Err(CoreError::DomainViolation(format!(
            "new next start {new_next_start} is not before stop {stop} of label {index}"
        )));
    }

    let mut first: Vec<(String, FieldValue)> = Vec::new();
    let mut second: Vec<(String, FieldValue)> = Vec::new();
    for (key, value) in kwargs.iter() {
        if let Some(field) = key.strip_prefix("new_next_") {
            second.push((field.to_string(), value.to_field_value()?));
        } else if let Some(field) = key.strip_prefix("new_") {
            first.push((field.to_string(), value.to_field_value()?));
        }
    }

    // The successor carries the original's start, stop and name plus the
    // `new_next_*` values. Extra fields never leak over from the original.
    let mut successor = Label::from_fields(
        original
            .fields()
            .iter()
            .filter(|(k, _)| CORE_FIELDS.contains(&k.as_str()))
            .cloned()
            .collect(),
    );
    for (field, value) in second {
        successor.set(&field, value);
    }
    let original = &mut labels[index];
    for (field, value) in first {
        original.set(&field, value);
    }
    labels.insert(index + 1, successor);
    Ok(())
}

fn delete(labels: &mut Vec<Label>, target: &Target<'_>) -> Result<(), CoreError> {
    if target.index >= labels.len() {
        return Err(out_of_range(target.index, labels));
    }
    labels.remove(target.index);
    Ok(())
}

fn create(labels: &mut Vec<Label>, target: &Target<'_>) -> Result<(), CoreError> {
    let index = target.index;
    if index > labels.len() {
        return Err(out_of_range(index, labels));
    }
    let mut fields = Vec::with_capacity(target.fields.len());
    for (key, value) in target.fields.iter() {
        if key != "index" {
            fields.push((key.to_string(), value.to_field_value()?));
        }
    }
    let label = Label::from_fields(fields);
    for required in CORE_FIELDS {
        if !label.contains(required) {
            return Err(CoreError::MissingField {
                index,
                field: required.to_string(),
            });
        }
    }
    labels.insert(index, label);
    Ok(())
}
