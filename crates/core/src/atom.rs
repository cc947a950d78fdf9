//! Mapping between token text and typed atoms.
//!
//! Symbols and keyword names are stored in canonical underscore form
//! (`merge_next`) and written back hyphenated (`merge-next`). Only the
//! characters after the first are rewritten, so a leading `_` or `-`
//! survives a round trip.

use std::fmt;

use crate::error::SyntaxError;
use crate::field_value::FieldValue;

/// Prefix that marks a keyword name, as in `#:new-name`.
pub const KEYWORD_MARKER: &str = "#:";

/// Literal token for the null atom.
pub const NULL_TOKEN: &str = "null";

#[derive(Debug, Clone)]
pub enum Atom {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Symbol(String),
    Keyword(String),
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Keyword(a), Self::Keyword(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Atom {}

impl Atom {
    pub fn symbol(name: &str) -> Self {
        Atom::Symbol(canonical_name(name))
    }

    pub fn keyword(name: &str) -> Self {
        Atom::Keyword(canonical_name(name))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Atom::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Atom::Keyword(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Atom::Null => "null",
            Atom::Integer(_) => "integer",
            Atom::Float(_) => "float",
            Atom::Text(_) => "string",
            Atom::Symbol(_) => "symbol",
            Atom::Keyword(_) => "keyword",
        }
    }

    /// Parse one token.
    ///
    /// Classification order: quoted string, `null`, integer, float, then
    /// keyword name or symbol. A quoted token must end at its closing quote
    /// and hold no other quote.
    pub fn from_token(token: &str) -> Result<Self, SyntaxError> {
        if let Some(rest) = token.strip_prefix('"') {
            return match rest.strip_suffix('"') {
                Some(inner) if !inner.contains('"') => Ok(Atom::Text(inner.to_string())),
                _ => Err(SyntaxError::MalformedString(token.to_string())),
            };
        }
        if token == NULL_TOKEN {
            return Ok(Atom::Null);
        }
        if let Ok(n) = token.parse::<i64>() {
            return Ok(Atom::Integer(n));
        }
        if token.bytes().any(|b| b.is_ascii_digit())
            && let Ok(x) = token.parse::<f64>()
        {
            return Ok(Atom::Float(x));
        }
        Ok(match token.strip_prefix(KEYWORD_MARKER) {
            Some(name) => Atom::Keyword(canonical_name(name)),
            None => Atom::Symbol(canonical_name(token)),
        })
    }

    /// Render as a token that [`Atom::from_token`] maps back to `self`.
    pub fn to_token(&self) -> Result<String, SyntaxError> {
        let token = match self {
            Atom::Null => NULL_TOKEN.to_string(),
            Atom::Integer(n) => n.to_string(),
            Atom::Float(x) => format!("{x:?}"),
            Atom::Text(s) => {
                if !is_representable_text(s) {
                    return Err(SyntaxError::Unrepresentable(s.clone()));
                }
                format!("\"{s}\"")
            }
            Atom::Symbol(name) => display_name(name),
            Atom::Keyword(name) => format!("{KEYWORD_MARKER}{}", display_name(name)),
        };
        if !matches!(self, Atom::Text(_)) && !is_bare_token(&token) {
            return Err(SyntaxError::Unrepresentable(token));
        }
        if Atom::from_token(&token).as_ref() != Ok(self) {
            return Err(SyntaxError::Unrepresentable(token));
        }
        Ok(token)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_token() {
            Ok(token) => write!(f, "{token}"),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

impl From<&FieldValue> for Atom {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => Atom::Null,
            FieldValue::Integer(n) => Atom::Integer(*n),
            FieldValue::Float(x) => Atom::Float(*x),
            FieldValue::Text(s) => Atom::Text(s.clone()),
        }
    }
}

impl From<FieldValue> for Atom {
    fn from(value: FieldValue) -> Self {
        Atom::from(&value)
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::Text(s.to_string())
    }
}

impl From<f64> for Atom {
    fn from(x: f64) -> Self {
        Atom::Float(x)
    }
}

impl From<i64> for Atom {
    fn from(n: i64) -> Self {
        Atom::Integer(n)
    }
}

/// Hyphens after the first character become underscores.
pub fn canonical_name(text: &str) -> String {
    rewrite_tail(text, '-', '_')
}

/// Underscores after the first character become hyphens.
pub fn display_name(name: &str) -> String {
    rewrite_tail(name, '_', '-')
}

fn rewrite_tail(text: &str, from: char, to: char) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(text.len());
            out.push(first);
            out.extend(chars.map(|c| if c == from { to } else { c }));
            out
        }
        None => String::new(),
    }
}

// Whitespace splitting rejoins string words with one space, so anything
// other than isolated spaces would come back changed.
fn is_representable_text(s: &str) -> bool {
    !s.contains('"')
        && !s.contains("  ")
        && !s.chars().any(|c| c.is_whitespace() && c != ' ')
}

fn is_bare_token(token: &str) -> bool {
    !token.is_empty()
        && !token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"'))
}
