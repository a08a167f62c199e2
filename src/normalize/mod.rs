//! Type normalizer: turns loosely typed records into precisely typed values.
//!
//! Two modes share one walk over the record:
//! - heuristic ([`TypeNormalizer::normalize`]) never fails and leaves anything
//!   ambiguous untouched;
//! - metadata-aware ([`TypeNormalizer::normalize_for_entity`]) applies the
//!   coercion demanded by each field's column type hint and raises when the
//!   value cannot satisfy it. Text under any other known hint stays text;
//!   fields with an unknown hint or none fall back to the heuristics.

mod heuristics;
mod hinted;

use std::sync::Arc;

use log::debug;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::config::MarshalConfig;
use crate::core::{MarshalError, Record, Result, Value, record_to_json};
use crate::entity::{EntityFieldMetadata, EntityMetadata, EntityRegistry, FieldKind};
use crate::mapping::type_map::is_known_hint;

use hinted::Coercion;

pub struct TypeNormalizer {
    config: MarshalConfig,
    registry: Option<Arc<EntityRegistry>>,
}

impl TypeNormalizer {
    /// Normalizer without entity lookup; only the heuristic mode and
    /// [`normalize_with_metadata`](Self::normalize_with_metadata) are usable.
    pub fn new(config: MarshalConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    pub fn with_registry(config: MarshalConfig, registry: Arc<EntityRegistry>) -> Self {
        Self {
            config,
            registry: Some(registry),
        }
    }

    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// Heuristic, schema-free normalization of a whole record.
    pub fn normalize(&self, record: &mut Record) {
        heuristics::normalize_record(&self.config, record);
    }

    /// Heuristic normalization of a single value stored under `property`.
    pub fn normalize_value(&self, property: &str, value: &mut Value) {
        heuristics::normalize_value(&self.config, property, value);
    }

    /// Metadata-aware normalization against a registered entity.
    pub fn normalize_for_entity(&self, record: &mut Record, entity_name: &str) -> Result<()> {
        let metadata = self.lookup(entity_name)?;
        self.normalize_with_metadata(record, &metadata)
    }

    /// Metadata-aware normalization against the given metadata.
    ///
    /// Keys are matched to fields by property name first, then by column name
    /// (case-insensitive). Unmatched keys get the heuristics.
    pub fn normalize_with_metadata(
        &self,
        record: &mut Record,
        metadata: &EntityMetadata,
    ) -> Result<()> {
        debug!(
            "Normalizing {} value(s) for entity '{}'",
            record.len(),
            metadata.entity_name
        );

        for (key, value) in record.iter_mut() {
            match find_field(metadata, key) {
                Some(field) => self.normalize_field(metadata, field, value)?,
                None => heuristics::normalize_value(&self.config, key, value),
            }
        }
        Ok(())
    }

    fn normalize_field(
        &self,
        metadata: &EntityMetadata,
        field: &EntityFieldMetadata,
        value: &mut Value,
    ) -> Result<()> {
        match &field.kind {
            FieldKind::Column(details) => {
                let hint = details.type_hint.as_deref();
                match hint.and_then(Coercion::for_hint) {
                    Some(coercion) => {
                        coercion.apply(&metadata.entity_name, &field.property_name, value)
                    }
                    // a declared non-temporal type keeps its text as written
                    None if hint.is_some_and(is_known_hint) && matches!(value, Value::Text(_)) => {
                        Ok(())
                    }
                    None => {
                        heuristics::normalize_value(&self.config, &field.property_name, value);
                        Ok(())
                    }
                }
            }
            FieldKind::Association(details) => {
                self.normalize_nested(&details.target_entity, &field.property_name, value)
            }
            FieldKind::Collection(details) => match value {
                Value::List(items) => {
                    for item in items.iter_mut() {
                        self.normalize_nested(&details.target_entity, &field.property_name, item)?;
                    }
                    Ok(())
                }
                Value::Null => Ok(()),
                other => Err(MarshalError::normalization(
                    &metadata.entity_name,
                    &field.property_name,
                    format!(
                        "collection of '{}' expects a list, got {}",
                        details.target_entity,
                        other.type_name()
                    ),
                )),
            },
        }
    }

    /// Nested entity value: a map is normalized against the target entity when
    /// it is registered, anything else (typically a bare key) heuristically.
    fn normalize_nested(&self, target: &str, property: &str, value: &mut Value) -> Result<()> {
        let target_metadata = match &self.registry {
            Some(registry) => registry.get(target)?,
            None => None,
        };

        match (value, target_metadata) {
            (Value::Map(nested), Some(target_metadata)) => {
                self.normalize_with_metadata(nested, &target_metadata)
            }
            (value, _) => {
                heuristics::normalize_value(&self.config, property, value);
                Ok(())
            }
        }
    }

    fn lookup(&self, entity_name: &str) -> Result<Arc<EntityMetadata>> {
        match &self.registry {
            Some(registry) => registry.require(entity_name),
            None => Err(MarshalError::EntityNotFound(entity_name.to_string())),
        }
    }

    /// Render a normalized record for external delivery as JSON.
    pub fn to_external(&self, record: &Record) -> JsonMap<String, JsonValue> {
        to_external(record)
    }
}

impl Default for TypeNormalizer {
    fn default() -> Self {
        Self::new(MarshalConfig::default())
    }
}

/// Timestamps as ISO-8601, binary as base64, decimals as numbers when exact.
pub fn to_external(record: &Record) -> JsonMap<String, JsonValue> {
    record_to_json(record)
}

/// Property name first, then the mapped column name (explicit, join column,
/// or the uppercased property) compared case-insensitively.
fn find_field<'a>(metadata: &'a EntityMetadata, key: &str) -> Option<&'a EntityFieldMetadata> {
    metadata.field(key).or_else(|| {
        metadata
            .fields
            .iter()
            .find(|field| column_name(field).eq_ignore_ascii_case(key))
    })
}

fn column_name(field: &EntityFieldMetadata) -> String {
    let explicit = match &field.kind {
        FieldKind::Column(details) => details.name.as_deref(),
        FieldKind::Association(details) => details.join_column.as_deref(),
        FieldKind::Collection(_) => None,
    };
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| field.property_name.to_uppercase())
}
