//! Symbolic-expression trees: parser and canonical serializer.
//!
//! `parse(&to_text(t)?)? == t` holds for every tree the code generators
//! build. Hand-written text reads back with canonical whitespace, not
//! byte-for-byte.

use std::fmt;

use crate::atom::Atom;
use crate::error::SyntaxError;
use crate::token::{self, CLOSE, OPEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexpr {
    Atom(Atom),
    Form(Vec<Sexpr>),
}

impl Sexpr {
    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Sexpr::Atom(a) => Some(a),
            Sexpr::Form(_) => None,
        }
    }

    pub fn as_form(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::Atom(_) => None,
            Sexpr::Form(items) => Some(items),
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        self.as_atom().and_then(Atom::as_symbol)
    }

    pub fn as_keyword(&self) -> Option<&str> {
        self.as_atom().and_then(Atom::as_keyword)
    }

    /// Render as one line of canonical command text.
    pub fn to_text(&self) -> Result<String, SyntaxError> {
        let mut tokens = Vec::new();
        self.write_tokens(&mut tokens)?;
        Ok(token::detokenize(&tokens))
    }

    /// Flatten into the token list [`read_from_tokens`] consumes.
    pub fn write_tokens(&self, tokens: &mut Vec<String>) -> Result<(), SyntaxError> {
        match self {
            Sexpr::Atom(atom) => tokens.push(atom.to_token()?),
            Sexpr::Form(items) => {
                tokens.push(OPEN.to_string());
                for item in items {
                    item.write_tokens(tokens)?;
                }
                tokens.push(CLOSE.to_string());
            }
        }
        Ok(())
    }
}

impl From<Atom> for Sexpr {
    fn from(atom: Atom) -> Self {
        Sexpr::Atom(atom)
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Atom(atom) => write!(f, "{atom}"),
            Sexpr::Form(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Parse exactly one expression from command text.
pub fn parse(text: &str) -> Result<Sexpr, SyntaxError> {
    let tokens = token::tokenize(text)?;
    let mut pos = 0;
    let expr = read_from_tokens(&tokens, &mut pos)?;
    if pos < tokens.len() {
        return Err(SyntaxError::TrailingTokens(tokens[pos..].join(" ")));
    }
    Ok(expr)
}

/// Read one expression starting at `*pos`, advancing past it.
pub fn read_from_tokens(tokens: &[String], pos: &mut usize) -> Result<Sexpr, SyntaxError> {
    let token = tokens.get(*pos).ok_or(SyntaxError::UnexpectedEof)?;
    *pos += 1;
    match token.as_str() {
        OPEN => {
            let mut items = Vec::new();
            loop {
                match tokens.get(*pos).map(String::as_str) {
                    None => return Err(SyntaxError::UnexpectedEof),
                    Some(CLOSE) => {
                        *pos += 1;
                        return Ok(Sexpr::Form(items));
                    }
                    Some(_) => items.push(read_from_tokens(tokens, pos)?),
                }
            }
        }
        CLOSE => Err(SyntaxError::UnexpectedCloseParen),
        other => Ok(Sexpr::Atom(Atom::from_token(other)?)),
    }
}
