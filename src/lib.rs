// ============================================================================
// entimap: entity declarations to relational mappings and typed parameters
// ============================================================================

pub mod binder;
pub mod config;
pub mod core;
pub mod entity;
pub mod facade;
pub mod mapping;
pub mod normalize;

// Re-export main types for convenience
pub use binder::{
    BoundParam, IndexedParams, MemoryStatement, NamedParam, NamedSql, NamedStatement,
    ParamSetter, ParameterBinder, ParameterMetadata, PreparedStatement,
};
pub use config::MarshalConfig;
pub use core::{MarshalError, Record, Result, SqlType, Value};
pub use entity::{EntityFieldMetadata, EntityMetadata, EntityRegistry, FieldKind, parse_entity};
pub use facade::Engine;
pub use mapping::{MappingCompiler, MappingDescriptor};
pub use normalize::TypeNormalizer;
