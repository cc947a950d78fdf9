pub mod error;
pub mod file;
pub mod schema;
pub mod traits;

pub use error::StorageError;
pub use file::FileStorage;
pub use schema::SessionMeta;
pub use traits::*;
