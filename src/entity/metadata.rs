use serde::{Deserialize, Serialize};

/// Structured form of one declared entity class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub entity_name: String,
    pub table_name: String,
    /// Where the declaration came from (file path or caller-chosen id).
    pub location: String,
    pub documentation: Option<String>,
    pub fields: Vec<EntityFieldMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFieldMetadata {
    pub property_name: String,
    /// Type annotation text as written, e.g. `number`, `Date`, `OrderItem[]`.
    pub source_type: String,
    pub is_identifier: bool,
    pub generation_strategy: Option<String>,
    pub documentation: Option<String>,
    pub kind: FieldKind,
}

/// What a field maps to; a field is exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Column(ColumnDetails),
    Association(AssociationDetails),
    Collection(CollectionDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDetails {
    pub name: Option<String>,
    /// Database type name as given in the declaration (`varchar`, `DECIMAL`, ...).
    pub type_hint: Option<String>,
    pub length: Option<u32>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

/// Many-to-one reference to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDetails {
    pub target_entity: String,
    pub join_column: Option<String>,
    pub cascade: Option<String>,
    pub not_null: bool,
    pub lazy: bool,
}

/// One-to-many "bag" of child entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDetails {
    pub target_entity: String,
    pub table: Option<String>,
    pub join_column: Option<String>,
    pub inverse: bool,
    pub lazy: bool,
    pub fetch: Option<String>,
    pub cascade: Option<String>,
    pub join_column_not_null: bool,
}

impl ColumnDetails {
    pub fn nullable() -> Self {
        Self {
            nullable: true,
            ..Self::default()
        }
    }
}

impl EntityMetadata {
    pub fn new(entity_name: impl Into<String>) -> Self {
        let entity_name = entity_name.into();
        Self {
            table_name: entity_name.to_uppercase(),
            entity_name,
            location: String::new(),
            documentation: None,
            fields: Vec::new(),
        }
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_field(mut self, field: EntityFieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    pub fn identifier(&self) -> Option<&EntityFieldMetadata> {
        self.fields.iter().find(|field| field.is_identifier)
    }

    pub fn field(&self, property_name: &str) -> Option<&EntityFieldMetadata> {
        self.fields
            .iter()
            .find(|field| field.property_name == property_name)
    }
}

impl EntityFieldMetadata {
    /// Plain column with default details.
    pub fn column(property_name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            source_type: source_type.into(),
            is_identifier: false,
            generation_strategy: None,
            documentation: None,
            kind: FieldKind::Column(ColumnDetails::nullable()),
        }
    }

    pub fn identifier(mut self) -> Self {
        self.is_identifier = true;
        self
    }

    pub fn generated(mut self, strategy: impl Into<String>) -> Self {
        self.generation_strategy = Some(strategy.into());
        self
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the database type hint; no-op for non-column fields.
    pub fn with_type_hint(mut self, hint: impl Into<String>) -> Self {
        if let FieldKind::Column(details) = &mut self.kind {
            details.type_hint = Some(hint.into());
        }
        self
    }

    pub fn column_details(&self) -> Option<&ColumnDetails> {
        match &self.kind {
            FieldKind::Column(details) => Some(details),
            _ => None,
        }
    }

    pub fn type_hint(&self) -> Option<&str> {
        self.column_details()
            .and_then(|details| details.type_hint.as_deref())
    }

    pub fn is_association(&self) -> bool {
        matches!(self.kind, FieldKind::Association(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, FieldKind::Collection(_))
    }
}
