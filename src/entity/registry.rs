use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, warn};
use lru::LruCache;

use super::metadata::EntityMetadata;
use super::parser::parse_entity;
use crate::config::MarshalConfig;
use crate::core::{MarshalError, Result, SqlType};
use crate::mapping::{MappingCompiler, MappingDescriptor, persisted_sql_type};

/// Cached descriptor together with the metadata it was compiled from.
type CachedMapping = (Arc<EntityMetadata>, Arc<MappingDescriptor>);

/// Entity metadata keyed by entity name.
///
/// Registration is last-write-wins. Readers see either the previous or the
/// new entry, never a partial one. Compiled descriptors are cached and checked
/// against the current entry on every hit, so re-registration never serves a
/// stale mapping.
pub struct EntityRegistry {
    entities: RwLock<HashMap<String, Arc<EntityMetadata>>>,
    mappings: Mutex<LruCache<String, CachedMapping>>,
    file_extension: String,
}

/// Outcome of [`EntityRegistry::load_dir`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failures: Vec<(PathBuf, MarshalError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::with_config(&MarshalConfig::default())
    }

    pub fn with_config(config: &MarshalConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.mapping_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entities: RwLock::new(HashMap::new()),
            mappings: Mutex::new(LruCache::new(capacity)),
            file_extension: config.entity_file_extension.clone(),
        }
    }

    /// Insert or replace the entry for `metadata.entity_name`.
    pub fn register(&self, metadata: EntityMetadata) -> Result<Arc<EntityMetadata>> {
        let name = metadata.entity_name.clone();
        let metadata = Arc::new(metadata);

        let previous = self
            .entities
            .write()?
            .insert(name.clone(), Arc::clone(&metadata));
        self.mappings.lock()?.pop(&name);

        if previous.is_some() {
            debug!("Replaced entity '{}'", name);
        } else {
            debug!("Registered entity '{}'", name);
        }
        Ok(metadata)
    }

    pub fn parse_and_register(&self, location: &str, source: &str) -> Result<Arc<EntityMetadata>> {
        let metadata = parse_entity(location, source)?;
        self.register(metadata)
    }

    pub fn get(&self, name: &str) -> Result<Option<Arc<EntityMetadata>>> {
        Ok(self.entities.read()?.get(name).cloned())
    }

    pub fn require(&self, name: &str) -> Result<Arc<EntityMetadata>> {
        self.get(name)?
            .ok_or_else(|| MarshalError::EntityNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.entities.read()?.contains_key(name))
    }

    pub fn remove(&self, name: &str) -> Result<Option<Arc<EntityMetadata>>> {
        let removed = self.entities.write()?.remove(name);
        self.mappings.lock()?.pop(name);
        Ok(removed)
    }

    /// Registered entity names, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.entities.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entities.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Compiled mapping for a registered entity, compiled at most once per registration.
    pub fn mapping(&self, name: &str) -> Result<Arc<MappingDescriptor>> {
        let metadata = self.require(name)?;

        if let Some((source, descriptor)) = self.mappings.lock()?.get(name) {
            if Arc::ptr_eq(source, &metadata) {
                return Ok(Arc::clone(descriptor));
            }
        }

        let descriptor = Arc::new(MappingCompiler::compile(&metadata)?);
        self.mappings
            .lock()?
            .put(name.to_string(), (metadata, Arc::clone(&descriptor)));
        Ok(descriptor)
    }

    /// Parameter type of a registered entity's id column; `None` when the
    /// entity is not registered.
    pub fn id_sql_type(&self, name: &str) -> Result<Option<SqlType>> {
        if !self.contains(name)? {
            return Ok(None);
        }
        let descriptor = self.mapping(name)?;
        Ok(Some(persisted_sql_type(&descriptor.id.type_name)))
    }

    /// Parse and register every entity source directly inside `dir`.
    ///
    /// Files are visited in name order. A file that fails to read or parse is
    /// logged and reported; it does not stop the rest from loading.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<LoadReport> {
        let suffix = format!(".{}", self.file_extension);
        let mut paths = fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(&suffix))
            })
            .collect::<Vec<_>>();
        paths.sort();

        let mut report = LoadReport::default();
        for path in paths {
            let location = path.display().to_string();
            let outcome = fs::read_to_string(&path)
                .map_err(MarshalError::from)
                .and_then(|source| self.parse_and_register(&location, &source));

            match outcome {
                Ok(metadata) => report.loaded.push(metadata.entity_name.clone()),
                Err(err) => {
                    warn!("Skipping entity source {}: {}", location, err);
                    report.failures.push((path, err));
                }
            }
        }

        debug!(
            "Loaded {} entity source(s) from {} ({} failed)",
            report.loaded.len(),
            dir.as_ref().display(),
            report.failures.len()
        );
        Ok(report)
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
