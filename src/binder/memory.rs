use std::collections::HashMap;

use super::metadata::ParameterMetadata;
use super::statement::{BoundParam, PreparedStatement};
use crate::core::{MarshalError, Result, SqlType};

/// Prepared statement that records what was bound instead of talking to a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatement {
    sql: Option<String>,
    types: Vec<SqlType>,
    type_names: HashMap<usize, String>,
    bound: Vec<Option<BoundParam>>,
    batches: Vec<Vec<BoundParam>>,
}

impl MemoryStatement {
    pub fn new(types: Vec<SqlType>) -> Self {
        let bound = vec![None; types.len()];
        Self {
            sql: None,
            types,
            type_names: HashMap::new(),
            bound,
            batches: Vec::new(),
        }
    }

    pub fn from_metadata(metadata: ParameterMetadata) -> Self {
        Self::new(metadata.into_types())
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Report a vendor type name for one slot instead of the canonical one.
    pub fn with_type_name(mut self, index: usize, type_name: impl Into<String>) -> Self {
        self.type_names.insert(index, type_name.into());
        self
    }

    pub fn bound(&self, index: usize) -> Option<&BoundParam> {
        index
            .checked_sub(1)
            .and_then(|i| self.bound.get(i))
            .and_then(Option::as_ref)
    }

    pub fn bound_params(&self) -> Vec<Option<&BoundParam>> {
        self.bound.iter().map(Option::as_ref).collect()
    }

    pub fn batches(&self) -> &[Vec<BoundParam>] {
        &self.batches
    }

    pub fn clear_parameters(&mut self) {
        self.bound.iter_mut().for_each(|slot| *slot = None);
    }

    fn slot(&self, index: usize) -> Result<usize> {
        if index == 0 || index > self.types.len() {
            return Err(MarshalError::Statement(format!(
                "Parameter index {} out of range (1..={})",
                index,
                self.types.len()
            )));
        }
        Ok(index - 1)
    }
}

impl PreparedStatement for MemoryStatement {
    fn parameter_count(&self) -> usize {
        self.types.len()
    }

    fn parameter_type(&self, index: usize) -> Result<SqlType> {
        Ok(self.types[self.slot(index)?])
    }

    fn parameter_type_name(&self, index: usize) -> Result<String> {
        let slot = self.slot(index)?;
        Ok(self
            .type_names
            .get(&index)
            .cloned()
            .unwrap_or_else(|| self.types[slot].name().to_string()))
    }

    fn bind(&mut self, index: usize, param: BoundParam) -> Result<()> {
        let slot = self.slot(index)?;
        self.bound[slot] = Some(param);
        Ok(())
    }

    fn add_batch(&mut self) -> Result<()> {
        let row = self
            .bound
            .iter()
            .enumerate()
            .map(|(slot, param)| {
                param.clone().ok_or_else(|| {
                    MarshalError::Statement(format!("Parameter {} is not bound", slot + 1))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.batches.push(row);
        self.clear_parameters();
        Ok(())
    }

    fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_index() {
        let mut statement = MemoryStatement::new(vec![SqlType::Integer]);
        assert!(matches!(
            statement.bind(2, BoundParam::Integer(1)),
            Err(MarshalError::Statement(_))
        ));
        assert!(statement.parameter_type(0).is_err());
    }

    #[test]
    fn test_add_batch_requires_every_parameter() {
        let mut statement = MemoryStatement::new(vec![SqlType::Integer, SqlType::VarChar]);
        statement.bind(1, BoundParam::Integer(1)).unwrap();
        assert!(statement.add_batch().is_err());

        statement.bind(2, BoundParam::Null(SqlType::VarChar)).unwrap();
        statement.add_batch().unwrap();
        assert_eq!(statement.batches().len(), 1);
        assert!(statement.bound(1).is_none());
    }

    #[test]
    fn test_vendor_type_name() {
        let statement = MemoryStatement::new(vec![SqlType::VarChar]).with_type_name(1, "nvarchar2");
        assert_eq!(statement.parameter_type_name(1).unwrap(), "nvarchar2");
    }
}
