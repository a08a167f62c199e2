pub mod codec;
pub mod error;
pub mod temporal;
pub mod types;
pub mod value;

pub use error::{MarshalError, Result};
pub use types::SqlType;
pub use value::{Record, Value, record_from_json, record_to_json};
