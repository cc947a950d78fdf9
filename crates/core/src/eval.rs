//! Evaluator for flat keyword-argument invocations.
//!
//! There are no special forms. A symbol resolves in the environment, other
//! atoms evaluate to themselves, and a form applies its head to the
//! `#:name value` pairs that follow it. Keyword names are never evaluated.

use std::collections::BTreeMap;

use tracing::trace;

use crate::atom::Atom;
use crate::error::CoreError;
use crate::field_value::FieldValue;
use crate::label::Label;
use crate::operations::Primitive;
use crate::sexpr::Sexpr;

/// The two record constructors that tag a `target` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Interval,
    IntervalPair,
}

impl RecordKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::IntervalPair => "interval_pair",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub fields: Kwargs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    Primitive(Primitive),
    Construct(RecordKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Keyword(String),
    Record(Record),
    Procedure(Procedure),
    /// Stands for the label sequence under correction.
    Labels,
    Unit,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Record(_) => "record",
            Value::Procedure(_) => "procedure",
            Value::Labels => "labels",
            Value::Unit => "unit",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Convert a scalar into something a label field can hold.
    pub fn to_field_value(&self) -> Result<FieldValue, CoreError> {
        match self {
            Value::Null => Ok(FieldValue::Null),
            Value::Integer(n) => Ok(FieldValue::Integer(*n)),
            Value::Float(x) => Ok(FieldValue::Float(*x)),
            Value::Text(s) => Ok(FieldValue::Text(s.clone())),
            other => Err(CoreError::TypeMismatch {
                expected: "number, string or null",
                found: other.type_name().to_string(),
            }),
        }
    }
}

/// Ordered keyword arguments. A repeated name keeps its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs(Vec<(String, Value)>);

impl Kwargs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, name: String, value: Value) {
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn require(&self, name: &str) -> Result<&Value, CoreError> {
        self.get(name)
            .ok_or_else(|| CoreError::ArityOrName(format!("missing argument {name}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// Explicit name bindings for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: BTreeMap<String, Value>,
}

impl Env {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every primitive, the `interval`/`interval_pair` constructors and
    /// `labels`.
    pub fn standard() -> Self {
        let mut env = Self::empty();
        for primitive in Primitive::ALL {
            env.bind(primitive.name(), Value::Procedure(Procedure::Primitive(primitive)));
        }
        for kind in [RecordKind::Interval, RecordKind::IntervalPair] {
            env.bind(kind.name(), Value::Procedure(Procedure::Construct(kind)));
        }
        env.bind("labels", Value::Labels);
        env
    }

    pub fn bind(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn lookup(&self, name: &str) -> Result<&Value, CoreError> {
        self.bindings
            .get(name)
            .ok_or_else(|| CoreError::UnboundName(name.to_string()))
    }
}

/// Evaluate `expr` against `env`; primitives mutate `labels` in place.
pub fn evaluate(expr: &Sexpr, env: &Env, labels: &mut Vec<Label>) -> Result<Value, CoreError> {
    match expr {
        Sexpr::Atom(atom) => match atom {
            Atom::Symbol(name) => env.lookup(name).cloned(),
            Atom::Null => Ok(Value::Null),
            Atom::Integer(n) => Ok(Value::Integer(*n)),
            Atom::Float(x) => Ok(Value::Float(*x)),
            Atom::Text(s) => Ok(Value::Text(s.clone())),
            Atom::Keyword(k) => Ok(Value::Keyword(k.clone())),
        },
        Sexpr::Form(items) => {
            let (head, rest) = items
                .split_first()
                .ok_or_else(|| CoreError::NotCallable("()".to_string()))?;
            let procedure = match evaluate(head, env, labels)? {
                Value::Procedure(p) => p,
                other => return Err(CoreError::NotCallable(other.type_name().to_string())),
            };
            let kwargs = evaluate_kwargs(rest, env, labels)?;
            apply(procedure, kwargs, labels)
        }
    }
}

fn evaluate_kwargs(
    items: &[Sexpr],
    env: &Env,
    labels: &mut Vec<Label>,
) -> Result<Kwargs, CoreError> {
    let mut kwargs = Kwargs::new();
    for pair in items.chunks(2) {
        let name = pair[0].as_keyword().ok_or_else(|| {
            CoreError::ArityOrName(format!("expected keyword name, found {}", pair[0]))
        })?;
        let value = pair
            .get(1)
            .ok_or_else(|| CoreError::ArityOrName(format!("keyword {name} has no value")))?;
        kwargs.insert(name.to_string(), evaluate(value, env, labels)?);
    }
    Ok(kwargs)
}

fn apply(procedure: Procedure, kwargs: Kwargs, labels: &mut Vec<Label>) -> Result<Value, CoreError> {
    match procedure {
        Procedure::Construct(kind) => Ok(Value::Record(Record { kind, fields: kwargs })),
        Procedure::Primitive(primitive) => {
            trace!(op = primitive.name(), args = kwargs.len(), "apply primitive");
            primitive.apply(labels, &kwargs)?;
            Ok(Value::Unit)
        }
    }
}
