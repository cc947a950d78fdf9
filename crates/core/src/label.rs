use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::field_value::FieldValue;
use crate::ids::LabelHash;

pub const START: &str = "start";
pub const STOP: &str = "stop";
pub const NAME: &str = "name";

/// Fields every label carries; everything else is an extra field.
pub const CORE_FIELDS: [&str; 3] = [START, STOP, NAME];

/// One timed, named interval. Field order is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Label {
    fields: Vec<(String, FieldValue)>,
}

impl Label {
    pub fn new(start: impl Into<FieldValue>, stop: impl Into<FieldValue>, name: &str) -> Self {
        Self {
            fields: vec![
                (START.to_string(), start.into()),
                (STOP.to_string(), stop.into()),
                (NAME.to_string(), FieldValue::from(name)),
            ],
        }
    }

    pub fn from_fields(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Overwrite `key` in place, or append it if absent.
    pub fn set(&mut self, key: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn start(&self) -> Option<f64> {
        self.get(START).and_then(FieldValue::as_f64)
    }

    pub fn stop(&self) -> Option<f64> {
        self.get(STOP).and_then(FieldValue::as_f64)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME).and_then(FieldValue::as_text)
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Fields other than start, stop and name, in order.
    pub fn extra_fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .filter(|(k, _)| !CORE_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Canonical text of a label sequence, one `(interval #:key value ...)`
/// line per label. Keys are written as stored and values in their escaped
/// debug form, so every label renders and distinct labels render
/// distinctly.
pub fn canonical_text(labels: &[Label]) -> String {
    let mut text = String::new();
    for label in labels {
        text.push_str("(interval");
        for (key, value) in label.fields() {
            if is_plain_key(key) {
                let _ = write!(text, " #:{key} ");
            } else {
                let _ = write!(text, " #:{key:?} ");
            }
            match value {
                FieldValue::Null => text.push_str("null"),
                FieldValue::Integer(n) => {
                    let _ = write!(text, "{n}");
                }
                FieldValue::Float(x) => {
                    let _ = write!(text, "{x:?}");
                }
                FieldValue::Text(s) => {
                    let _ = write!(text, "{s:?}");
                }
            }
        }
        text.push_str(")\n");
    }
    text
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Digest of the canonical text, used as the session's identity guard.
pub fn label_hash(labels: &[Label]) -> LabelHash {
    let text = canonical_text(labels);
    LabelHash::from_bytes(*blake3::hash(text.as_bytes()).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_in_place_and_appends_new_keys() {
        let mut label = Label::new(1.0, 2.0, "a").with_field("tier", "female");
        label.set(NAME, FieldValue::from("b"));
        label.set("note", FieldValue::from("x"));
        let keys: Vec<&str> = label.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["start", "stop", "name", "tier", "note"]);
        assert_eq!(label.name(), Some("b"));
    }

    #[test]
    fn extra_fields_skip_core_fields() {
        let label = Label::new(1.0, 2.0, "a").with_field("tier", "female");
        let extras: Vec<&str> = label.extra_fields().map(|(k, _)| k).collect();
        assert_eq!(extras, vec!["tier"]);
    }

    #[test]
    fn canonical_text_renders_one_form_per_line() {
        let labels = vec![Label::new(1.0, 2.1, "a"), Label::new(2.1, 3.5, "b")];
        assert_eq!(
            canonical_text(&labels),
            "(interval #:start 1.0 #:stop 2.1 #:name \"a\")\n(interval #:start 2.1 #:stop 3.5 #:name \"b\")\n"
        );
    }

    #[test]
    fn canonical_text_escapes_awkward_text() {
        let labels = vec![
            Label::new(1.0, 2.0, "say \"hi\"")
                .with_field("note", "two  spaces\nand a line")
                .with_field("odd key", FieldValue::Null),
        ];
        assert_eq!(
            canonical_text(&labels),
            concat!(
                r#"(interval #:start 1.0 #:stop 2.0 #:name "say \"hi\"" "#,
                r#"#:note "two  spaces\nand a line" #:"odd key" null)"#,
                "\n"
            )
        );
    }

    #[test]
    fn hash_tracks_content() {
        let a = vec![Label::new(1.0, 2.1, "a")];
        let b = vec![Label::new(1.0, 2.1, "b")];
        let quoted = vec![Label::new(1.0, 2.1, "a\"")];
        assert_eq!(label_hash(&a), label_hash(&a.clone()));
        assert_ne!(label_hash(&a), label_hash(&b));
        assert_ne!(label_hash(&a), label_hash(&quoted));
        assert_ne!(
            label_hash(&[Label::new(1i64, 2i64, "a")]),
            label_hash(&[Label::new(1.0, 2.0, "a")])
        );
    }
}
