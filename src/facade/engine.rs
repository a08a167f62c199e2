use std::path::Path;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::binder::{
    NamedParam, NamedSql, NamedStatement, ParameterBinder, ParameterMetadata, PreparedStatement,
};
use crate::config::MarshalConfig;
use crate::core::{Record, Result, Value};
use crate::entity::{EntityMetadata, EntityRegistry, LoadReport};
use crate::mapping::MappingDescriptor;
use crate::normalize::TypeNormalizer;

/// Registry, mapping compiler, normalizer and binder behind one handle.
///
/// # Examples
///
/// ```
/// use entimap::{Engine, MemoryStatement, Record, SqlType, Value};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Engine::new();
/// engine.register_source(
///     "Customer.ts",
///     "@Entity() class Customer { @Id() id: number; @Column({ type: 'varchar' }) name: string; }",
/// )?;
///
/// let xml = engine.mapping_xml("Customer")?;
/// assert!(xml.contains(r#"<property name="name" column="NAME" type="string"/>"#));
///
/// let mut record = Record::new();
/// record.insert("id".into(), Value::Float(7.0));
/// record.insert("name".into(), Value::from("'Ada'"));
///
/// let mut statement = MemoryStatement::new(vec![SqlType::BigInt, SqlType::VarChar]);
/// engine.bind_record("Customer", &mut record, &["ID", "NAME"], &mut statement)?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    registry: Arc<EntityRegistry>,
    normalizer: TypeNormalizer,
    binder: ParameterBinder,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(MarshalConfig::default())
    }

    pub fn with_config(config: MarshalConfig) -> Self {
        let registry = Arc::new(EntityRegistry::with_config(&config));
        Self {
            normalizer: TypeNormalizer::with_registry(config, Arc::clone(&registry)),
            registry,
            binder: ParameterBinder::new(),
        }
    }

    pub fn config(&self) -> &MarshalConfig {
        self.normalizer.config()
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    pub fn normalizer(&self) -> &TypeNormalizer {
        &self.normalizer
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    /// Parse an entity source and register it, replacing any entity of the same name.
    pub fn register_source(&self, location: &str, source: &str) -> Result<Arc<EntityMetadata>> {
        self.registry.parse_and_register(location, source)
    }

    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<LoadReport> {
        self.registry.load_dir(dir)
    }

    pub fn entity(&self, name: &str) -> Result<Arc<EntityMetadata>> {
        self.registry.require(name)
    }

    pub fn mapping(&self, entity_name: &str) -> Result<Arc<MappingDescriptor>> {
        self.registry.mapping(entity_name)
    }

    pub fn mapping_xml(&self, entity_name: &str) -> Result<String> {
        Ok(self.mapping(entity_name)?.to_xml())
    }

    pub fn normalize(&self, record: &mut Record) {
        self.normalizer.normalize(record);
    }

    pub fn normalize_for_entity(&self, record: &mut Record, entity_name: &str) -> Result<()> {
        self.normalizer.normalize_for_entity(record, entity_name)
    }

    pub fn to_external(&self, record: &Record) -> JsonMap<String, JsonValue> {
        self.normalizer.to_external(record)
    }

    /// Placeholder types of `sql`, taken from the entity's mapping.
    ///
    /// Join columns take the id type of the registered target entity, VARCHAR
    /// when the target is unknown.
    pub fn parameter_metadata(&self, entity_name: &str, sql: &str) -> Result<ParameterMetadata> {
        let descriptor = self.mapping(entity_name)?;
        ParameterMetadata::infer_with_targets(sql, &descriptor, |target| {
            self.registry.id_sql_type(target).ok().flatten()
        })
    }

    pub fn prepare_named(&self, sql: &str) -> Result<NamedSql> {
        NamedSql::parse(sql)
    }

    pub fn bind_indexed<S>(&self, values: &[Value], statement: &mut S) -> Result<()>
    where
        S: PreparedStatement + ?Sized,
    {
        self.binder.bind_indexed(values, statement)
    }

    pub fn bind_named<S: PreparedStatement>(
        &self,
        params: &[NamedParam],
        statement: &mut NamedStatement<S>,
    ) -> Result<()> {
        self.binder.bind_named(params, statement)
    }

    pub fn bind_many_indexed<S>(&self, rows: &[Vec<Value>], statement: &mut S) -> Result<usize>
    where
        S: PreparedStatement + ?Sized,
    {
        self.binder.bind_many_indexed(rows, statement)
    }

    /// Normalize `record` against an entity, then bind the values for
    /// `columns` in order. Columns map back to properties through the entity's
    /// mapping; a missing value binds as NULL.
    pub fn bind_record<S>(
        &self,
        entity_name: &str,
        record: &mut Record,
        columns: &[&str],
        statement: &mut S,
    ) -> Result<()>
    where
        S: PreparedStatement + ?Sized,
    {
        self.normalizer.normalize_for_entity(record, entity_name)?;
        let descriptor = self.mapping(entity_name)?;

        let values: Vec<Value> = columns
            .iter()
            .map(|column| {
                let property = descriptor.property_for_column(column).unwrap_or(column);
                record_value(record, property, column)
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect();

        self.binder.bind_indexed(&values, statement)
    }
}

/// Same key rules as entity-aware normalization: the property name, then the
/// column name in any case.
fn record_value<'a>(record: &'a Record, property: &str, column: &str) -> Option<&'a Value> {
    record.get(property).or_else(|| {
        record
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
