use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::core::{Result, SqlType};

/// A typed value ready to be handed to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParam {
    /// SQL NULL with the declared type of the slot.
    Null(SqlType),
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Decimal(BigDecimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Binary content bound as a stream of `length` bytes.
    BinaryStream { bytes: Vec<u8>, length: usize },
    /// Character content bound as a stream of `length` characters.
    CharacterStream { text: String, length: usize },
    Uuid(Uuid),
}

impl BoundParam {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }
}

/// Prepared statement seam between the binder and a database driver.
///
/// Parameter indices are 1-based.
pub trait PreparedStatement {
    fn parameter_count(&self) -> usize;

    /// Declared SQL type of a parameter slot.
    fn parameter_type(&self, index: usize) -> Result<SqlType>;

    /// Database type name of a slot; drivers may report vendor names.
    fn parameter_type_name(&self, index: usize) -> Result<String> {
        Ok(self.parameter_type(index)?.name().to_string())
    }

    fn bind(&mut self, index: usize, param: BoundParam) -> Result<()>;

    /// Queue the currently bound parameters as one batch entry.
    fn add_batch(&mut self) -> Result<()>;

    /// SQL text, when known; only used to give errors context.
    fn sql(&self) -> Option<&str> {
        None
    }
}

impl<S: PreparedStatement + ?Sized> PreparedStatement for &mut S {
    fn parameter_count(&self) -> usize {
        (**self).parameter_count()
    }

    fn parameter_type(&self, index: usize) -> Result<SqlType> {
        (**self).parameter_type(index)
    }

    fn parameter_type_name(&self, index: usize) -> Result<String> {
        (**self).parameter_type_name(index)
    }

    fn bind(&mut self, index: usize, param: BoundParam) -> Result<()> {
        (**self).bind(index, param)
    }

    fn add_batch(&mut self) -> Result<()> {
        (**self).add_batch()
    }

    fn sql(&self) -> Option<&str> {
        (**self).sql()
    }
}
