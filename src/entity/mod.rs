//! Entity declarations: parsing, metadata and the registry.

mod lexer;
pub mod metadata;
pub mod parser;
pub mod registry;

pub use metadata::{
    AssociationDetails, CollectionDetails, ColumnDetails, EntityFieldMetadata, EntityMetadata,
    FieldKind,
};
pub use parser::parse_entity;
pub use registry::{EntityRegistry, LoadReport};
