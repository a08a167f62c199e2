//! Mapping compiler: entity metadata to a relational mapping descriptor and its XML form.

pub mod compiler;
pub mod descriptor;
pub mod type_map;
mod xml;

pub use compiler::MappingCompiler;
pub use descriptor::{
    AssociationDescriptor, CollectionDescriptor, IdDescriptor, MappingDescriptor,
    PropertyDescriptor,
};
pub use type_map::{persisted_sql_type, resolve_persisted_type, resolve_source_type, resolve_type};
