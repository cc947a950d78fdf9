pub mod atom;
pub mod command;
pub mod error;
pub mod eval;
pub mod field_value;
pub mod ids;
pub mod invert;
pub mod label;
pub mod operations;
pub mod sexpr;
pub mod token;

pub use atom::Atom;
pub use command::{Command, CommandBuilder};
pub use error::{CoreError, SyntaxError};
pub use eval::{Env, Kwargs, RecordKind, Value, evaluate};
pub use field_value::FieldValue;
pub use ids::{LabelHash, SessionId};
pub use label::Label;
pub use operations::Primitive;
pub use sexpr::{Sexpr, parse};
