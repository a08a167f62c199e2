//! Parameter binder: loosely typed values onto prepared statement parameters.

pub mod memory;
pub mod metadata;
pub mod named;
mod param_binder;
pub mod payload;
pub mod setters;
pub mod statement;

pub use param_binder::ParameterBinder;
pub use memory::MemoryStatement;
pub use metadata::ParameterMetadata;
pub use named::{NamedSql, NamedStatement};
pub use payload::{IndexedParams, NamedParam};
pub use setters::ParamSetter;
pub use statement::{BoundParam, PreparedStatement};
