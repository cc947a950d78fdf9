use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unterminated string")]
    UnterminatedString,

    #[error("unexpected )")]
    UnexpectedCloseParen,

    #[error("unexpected EOF")]
    UnexpectedEof,

    #[error("malformed string token: {0}")]
    MalformedString(String),

    #[error("trailing tokens after expression: {0}")]
    TrailingTokens(String),

    #[error("string cannot be written as an atom: {0:?}")]
    Unrepresentable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("unbound name: {0}")]
    UnboundName(String),

    #[error("bad argument list: {0}")]
    ArityOrName(String),

    #[error("not callable: {0}")]
    NotCallable(String),

    #[error("label {index} has no field {field:?}")]
    MissingField { index: usize, field: String },

    #[error("domain violation: {0}")]
    DomainViolation(String),

    #[error("index {index} out of range for {len} labels")]
    Index { index: usize, len: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("target has no pre-state for {0:?}")]
    MissingPreState(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),
}
