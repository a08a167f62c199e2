use log::debug;

use super::descriptor::{
    AssociationDescriptor, CollectionDescriptor, IdDescriptor, MappingDescriptor,
    PropertyDescriptor,
};
use super::type_map::resolve_persisted_type;
use crate::core::{MarshalError, Result};
use crate::entity::{
    AssociationDetails, CollectionDetails, ColumnDetails, EntityFieldMetadata, EntityMetadata,
    FieldKind,
};

const DEFAULT_GENERATOR: &str = "assigned";

/// Turns entity metadata into a mapping descriptor.
pub struct MappingCompiler;

impl MappingCompiler {
    pub fn compile(metadata: &EntityMetadata) -> Result<MappingDescriptor> {
        let _span = tracing::debug_span!("compile_mapping", entity = %metadata.entity_name).entered();

        let id_field = metadata.identifier().ok_or_else(|| {
            MarshalError::mapping(&metadata.entity_name, "no field is marked as identifier")
        })?;
        let id = Self::compile_id(metadata, id_field)?;

        let mut properties = Vec::new();
        let mut associations = Vec::new();
        let mut collections = Vec::new();

        for field in metadata.fields.iter().filter(|field| !field.is_identifier) {
            match &field.kind {
                FieldKind::Column(details) => {
                    properties.push(Self::compile_property(field, details));
                }
                FieldKind::Association(details) => {
                    associations.push(Self::compile_association(field, details));
                }
                FieldKind::Collection(details) => {
                    collections.push(Self::compile_collection(field, details, &id));
                }
            }
        }

        debug!(
            "Compiled mapping for '{}': {} properties, {} associations, {} collections",
            metadata.entity_name,
            properties.len(),
            associations.len(),
            collections.len()
        );

        Ok(MappingDescriptor {
            entity_name: metadata.entity_name.clone(),
            table_name: metadata.table_name.clone(),
            id,
            properties,
            associations,
            collections,
        })
    }

    fn compile_id(metadata: &EntityMetadata, field: &EntityFieldMetadata) -> Result<IdDescriptor> {
        let details = field.column_details().ok_or_else(|| {
            MarshalError::mapping(
                &metadata.entity_name,
                format!(
                    "identifier '{}' must be a scalar column",
                    field.property_name
                ),
            )
        })?;

        let generator = field
            .generation_strategy
            .as_deref()
            .map(str::trim)
            .filter(|strategy| !strategy.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_GENERATOR.to_string());

        Ok(IdDescriptor {
            name: field.property_name.clone(),
            column: column_name(details.name.as_deref(), &field.property_name),
            type_name: resolve_persisted_type(details.type_hint.as_deref(), &field.source_type),
            generator,
        })
    }

    fn compile_property(field: &EntityFieldMetadata, details: &ColumnDetails) -> PropertyDescriptor {
        PropertyDescriptor {
            name: field.property_name.clone(),
            column: column_name(details.name.as_deref(), &field.property_name),
            type_name: resolve_persisted_type(details.type_hint.as_deref(), &field.source_type),
            length: details.length,
            not_null: !details.nullable,
            precision: details.precision,
            scale: details.scale,
        }
    }

    fn compile_association(
        field: &EntityFieldMetadata,
        details: &AssociationDetails,
    ) -> AssociationDescriptor {
        AssociationDescriptor {
            name: field.property_name.clone(),
            target_entity: details.target_entity.clone(),
            column: column_name(details.join_column.as_deref(), &field.property_name),
            cascade: details.cascade.clone(),
            lazy: details.lazy,
            not_null: details.not_null,
        }
    }

    fn compile_collection(
        field: &EntityFieldMetadata,
        details: &CollectionDetails,
        id: &IdDescriptor,
    ) -> CollectionDescriptor {
        let key_column = details
            .join_column
            .as_deref()
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.column.clone());

        CollectionDescriptor {
            name: field.property_name.clone(),
            target_entity: details.target_entity.clone(),
            table: details.table.clone(),
            key_column,
            key_not_null: details.join_column_not_null,
            inverse: details.inverse,
            lazy: details.lazy,
            fetch: details.fetch.clone(),
            cascade: details.cascade.clone(),
        }
    }
}

/// Explicit column name, else the upper-cased property name.
fn column_name(explicit: Option<&str>, property_name: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| property_name.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> EntityMetadata {
        EntityMetadata::new("Order")
            .with_table("ORDERS")
            .with_field(EntityFieldMetadata::column("id", "number").identifier())
            .with_field(EntityFieldMetadata::column("name", "string").with_type_hint("varchar"))
    }

    #[test]
    fn test_identifier_defaults() {
        let descriptor = MappingCompiler::compile(&order()).unwrap();

        assert_eq!(descriptor.id.name, "id");
        assert_eq!(descriptor.id.column, "ID");
        assert_eq!(descriptor.id.type_name, "long");
        assert_eq!(descriptor.id.generator, "assigned");
        assert_eq!(descriptor.property("name").unwrap().type_name, "string");
    }

    #[test]
    fn test_generator_is_lowercased() {
        let mut metadata = order();
        metadata.fields[0].generation_strategy = Some("IDENTITY".into());

        let descriptor = MappingCompiler::compile(&metadata).unwrap();
        assert_eq!(descriptor.id.generator, "identity");
    }

    #[test]
    fn test_missing_identifier_is_mapping_error() {
        let metadata = EntityMetadata::new("Loose")
            .with_field(EntityFieldMetadata::column("name", "string"));

        match MappingCompiler::compile(&metadata) {
            Err(MarshalError::Mapping { entity, message }) => {
                assert_eq!(entity, "Loose");
                assert!(message.contains("identifier"));
            }
            other => panic!("Expected mapping error, got {:?}", other),
        }
    }

    #[test]
    fn test_collection_key_defaults_to_owner_id_column() {
        let metadata = order().with_field(
            EntityFieldMetadata::column("items", "OrderItem[]").with_kind(FieldKind::Collection(
                CollectionDetails {
                    target_entity: "OrderItem".into(),
                    table: None,
                    join_column: None,
                    inverse: false,
                    lazy: false,
                    fetch: None,
                    cascade: None,
                    join_column_not_null: false,
                },
            )),
        );

        let descriptor = MappingCompiler::compile(&metadata).unwrap();
        assert_eq!(descriptor.collection("items").unwrap().key_column, "ID");
        assert!(descriptor.properties.iter().all(|p| p.name != "items"));
    }

    #[test]
    fn test_column_lookup_helpers() {
        let metadata = order().with_field(
            EntityFieldMetadata::column("customer", "Customer").with_kind(FieldKind::Association(
                AssociationDetails {
                    target_entity: "Customer".into(),
                    join_column: Some("CUSTOMER_ID".into()),
                    cascade: None,
                    not_null: true,
                    lazy: false,
                },
            )),
        );

        let descriptor = MappingCompiler::compile(&metadata).unwrap();
        assert_eq!(descriptor.property_for_column("name"), Some("name"));
        assert_eq!(descriptor.property_for_column("customer_id"), Some("customer"));
        assert_eq!(descriptor.column_sql_type("CUSTOMER_ID"), None);
        assert_eq!(
            descriptor
                .association_for_column("customer_id")
                .map(|association| association.target_entity.as_str()),
            Some("Customer")
        );
        assert_eq!(descriptor.columns(), vec!["ID", "CUSTOMER_ID", "NAME"]);
    }
}
