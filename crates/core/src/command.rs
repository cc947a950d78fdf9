use std::fmt;

use crate::atom::Atom;
use crate::error::CoreError;
use crate::eval::{self, Env, RecordKind, Value};
use crate::label::Label;
use crate::operations::Primitive;
use crate::sexpr::{self, Sexpr};

/// One self-describing invocation:
/// `(op #:target (kind #:field value ...) #:new-field value ...)`.
///
/// Every `new_<field>` argument has a sibling `<field>` inside the target,
/// so the command alone is enough to compute its inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(Sexpr);

impl Command {
    /// Accept a parsed tree whose head is a symbol.
    pub fn from_sexpr(expr: Sexpr) -> Result<Self, CoreError> {
        match expr.as_form().and_then(|items| items.first()) {
            Some(head) if head.as_symbol().is_some() => Ok(Self(expr)),
            _ => Err(CoreError::InvalidCommand(format!(
                "command must be a form headed by a symbol: {expr}"
            ))),
        }
    }

    pub fn parse(text: &str) -> Result<Self, CoreError> {
        Self::from_sexpr(sexpr::parse(text)?)
    }

    pub fn to_text(&self) -> Result<String, CoreError> {
        Ok(self.0.to_text()?)
    }

    pub fn as_sexpr(&self) -> &Sexpr {
        &self.0
    }

    pub fn into_sexpr(self) -> Sexpr {
        self.0
    }

    pub(crate) fn items(&self) -> &[Sexpr] {
        self.0.as_form().unwrap_or_default()
    }

    /// Canonical operation name, e.g. `merge_next`.
    pub fn op_name(&self) -> &str {
        self.items()
            .first()
            .and_then(Sexpr::as_symbol)
            .unwrap_or_default()
    }

    pub fn primitive(&self) -> Option<Primitive> {
        Primitive::from_name(self.op_name())
    }

    /// Value following `#:<name>` among the top-level arguments.
    pub fn argument(&self, name: &str) -> Option<&Sexpr> {
        keyword_value(self.items(), name)
    }

    /// Fields of the `#:target` record, without its kind symbol.
    pub fn target_field(&self, name: &str) -> Option<&Sexpr> {
        let target = self.argument("target")?.as_form()?;
        keyword_value(target, name)
    }

    pub fn evaluate(&self, env: &Env, labels: &mut Vec<Label>) -> Result<Value, CoreError> {
        eval::evaluate(&self.0, env, labels)
    }

    pub fn invert(&self) -> Result<Command, CoreError> {
        crate::invert::invert(self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Look up `#:<name>` in a keyword list laid out as `head #:k v #:k v ...`.
pub(crate) fn keyword_position(items: &[Sexpr], name: &str) -> Option<usize> {
    (1..items.len())
        .step_by(2)
        .find(|&i| items[i].as_keyword() == Some(name) && i + 1 < items.len())
}

fn keyword_value<'a>(items: &'a [Sexpr], name: &str) -> Option<&'a Sexpr> {
    keyword_position(items, name).map(|i| &items[i + 1])
}

/// Assembles commands in the shape the inverter expects.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    op: Primitive,
    kind: RecordKind,
    target: Vec<(String, Atom)>,
    args: Vec<(String, Atom)>,
}

impl CommandBuilder {
    pub fn new(op: Primitive, kind: RecordKind, index: usize) -> Self {
        Self {
            op,
            kind,
            target: vec![("index".to_string(), Atom::Integer(index as i64))],
            args: Vec::new(),
        }
    }

    /// Pre-state field inside `#:target`.
    pub fn target(mut self, key: &str, value: impl Into<Atom>) -> Self {
        self.target.push((key.to_string(), value.into()));
        self
    }

    /// Top-level argument, usually a `new_<field>`.
    pub fn arg(mut self, key: &str, value: impl Into<Atom>) -> Self {
        self.args.push((key.to_string(), value.into()));
        self
    }

    pub fn build(self) -> Command {
        let mut target = vec![Sexpr::Atom(Atom::symbol(self.kind.name()))];
        for (key, value) in self.target {
            target.push(Sexpr::Atom(Atom::keyword(&key)));
            target.push(Sexpr::Atom(value));
        }
        let mut items = vec![
            Sexpr::Atom(Atom::symbol(self.op.name())),
            Sexpr::Atom(Atom::keyword("target")),
            Sexpr::Form(target),
        ];
        for (key, value) in self.args {
            items.push(Sexpr::Atom(Atom::keyword(&key)));
            items.push(Sexpr::Atom(value));
        }
        Command(Sexpr::Form(items))
    }
}
