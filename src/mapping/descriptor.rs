use serde::Serialize;

use super::type_map::persisted_sql_type;
use crate::core::SqlType;

/// Compiled object/relational mapping for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingDescriptor {
    pub entity_name: String,
    pub table_name: String,
    pub id: IdDescriptor,
    pub properties: Vec<PropertyDescriptor>,
    pub associations: Vec<AssociationDescriptor>,
    pub collections: Vec<CollectionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdDescriptor {
    pub name: String,
    pub column: String,
    pub type_name: String,
    /// Lower-cased generator class, `assigned` when none was declared.
    pub generator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub column: String,
    pub type_name: String,
    pub length: Option<u32>,
    pub not_null: bool,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationDescriptor {
    pub name: String,
    pub target_entity: String,
    pub column: String,
    pub cascade: Option<String>,
    pub lazy: bool,
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionDescriptor {
    pub name: String,
    pub target_entity: String,
    pub table: Option<String>,
    pub key_column: String,
    pub key_not_null: bool,
    pub inverse: bool,
    pub lazy: bool,
    pub fetch: Option<String>,
    pub cascade: Option<String>,
}

impl MappingDescriptor {
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationDescriptor> {
        self.associations
            .iter()
            .find(|association| association.name == name)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionDescriptor> {
        self.collections
            .iter()
            .find(|collection| collection.name == name)
    }

    /// Property (or id) name owning a column, compared case-insensitively.
    pub fn property_for_column(&self, column: &str) -> Option<&str> {
        if self.id.column.eq_ignore_ascii_case(column) {
            return Some(&self.id.name);
        }
        self.properties
            .iter()
            .find(|property| property.column.eq_ignore_ascii_case(column))
            .map(|property| property.name.as_str())
            .or_else(|| {
                self.associations
                    .iter()
                    .find(|association| association.column.eq_ignore_ascii_case(column))
                    .map(|association| association.name.as_str())
            })
    }

    /// Parameter type for an id or property column.
    ///
    /// Join columns are not covered: their type is the target entity's id
    /// type, which only the registry knows.
    pub fn column_sql_type(&self, column: &str) -> Option<SqlType> {
        if self.id.column.eq_ignore_ascii_case(column) {
            return Some(persisted_sql_type(&self.id.type_name));
        }
        self.properties
            .iter()
            .find(|property| property.column.eq_ignore_ascii_case(column))
            .map(|property| persisted_sql_type(&property.type_name))
    }

    pub fn association_for_column(&self, column: &str) -> Option<&AssociationDescriptor> {
        self.associations
            .iter()
            .find(|association| association.column.eq_ignore_ascii_case(column))
    }

    /// Every mapped column in XML order: id, associations, properties.
    pub fn columns(&self) -> Vec<&str> {
        std::iter::once(self.id.column.as_str())
            .chain(self.associations.iter().map(|a| a.column.as_str()))
            .chain(self.properties.iter().map(|p| p.column.as_str()))
            .collect()
    }
}

impl AssociationDescriptor {
    /// Cascade value to render; `none` and blank count as absent.
    pub fn active_cascade(&self) -> Option<&str> {
        active_cascade(self.cascade.as_deref())
    }
}

impl CollectionDescriptor {
    pub fn active_cascade(&self) -> Option<&str> {
        active_cascade(self.cascade.as_deref())
    }
}

fn active_cascade(cascade: Option<&str>) -> Option<&str> {
    cascade
        .map(str::trim)
        .filter(|cascade| !cascade.is_empty() && !cascade.eq_ignore_ascii_case("none"))
}
