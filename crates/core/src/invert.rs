//! Syntactic inversion of commands.
//!
//! For each `#:new-<field>` argument the value is swapped with the sibling
//! `#:<field>` inside the target, and the head is replaced by the paired
//! operation. Labels are never consulted and the input is left untouched.

use crate::atom::Atom;
use crate::command::{Command, keyword_position};
use crate::error::CoreError;
use crate::operations::Primitive;
use crate::sexpr::Sexpr;

pub fn invert(command: &Command) -> Result<Command, CoreError> {
    let items = command.items();
    let primitive = Primitive::from_name(command.op_name())
        .ok_or_else(|| CoreError::UnknownOperation(command.op_name().to_string()))?;

    let target_at = keyword_position(items, "target")
        .map(|i| i + 1)
        .ok_or_else(|| CoreError::InvalidCommand(format!("no #:target in {command}")))?;
    let target = items[target_at]
        .as_form()
        .ok_or_else(|| CoreError::InvalidCommand(format!("#:target is not a form in {command}")))?;

    let mut inverted = items.to_vec();
    let mut new_target = target.to_vec();
    inverted[0] = Sexpr::Atom(Atom::symbol(primitive.inverse().name()));

    for i in (1..items.len()).step_by(2) {
        let Some(field) = items[i].as_keyword().and_then(|k| k.strip_prefix("new_")) else {
            continue;
        };
        let Some(post) = items.get(i + 1) else {
            continue;
        };
        let slot = keyword_position(target, field)
            .map(|j| j + 1)
            .ok_or_else(|| CoreError::MissingPreState(field.to_string()))?;
        inverted[i + 1] = target[slot].clone();
        new_target[slot] = post.clone();
    }
    inverted[target_at] = Sexpr::Form(new_target);

    Command::from_sexpr(Sexpr::Form(inverted))
}
