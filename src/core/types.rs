use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical database column types a statement parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Null,
    Bit,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    LongNVarChar,
    Clob,
    NClob,
    Date,
    Time,
    Timestamp,
    TimestampWithTimezone,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Uuid,
}

impl SqlType {
    pub const ALL: &'static [SqlType] = &[
        Self::Null,
        Self::Bit,
        Self::Boolean,
        Self::TinyInt,
        Self::SmallInt,
        Self::Integer,
        Self::BigInt,
        Self::Real,
        Self::Float,
        Self::Double,
        Self::Numeric,
        Self::Decimal,
        Self::Char,
        Self::VarChar,
        Self::LongVarChar,
        Self::NChar,
        Self::NVarChar,
        Self::LongNVarChar,
        Self::Clob,
        Self::NClob,
        Self::Date,
        Self::Time,
        Self::Timestamp,
        Self::TimestampWithTimezone,
        Self::Binary,
        Self::VarBinary,
        Self::LongVarBinary,
        Self::Blob,
        Self::Uuid,
    ];

    /// Canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bit => "BIT",
            Self::Boolean => "BOOLEAN",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Real => "REAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Numeric => "NUMERIC",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHAR",
            Self::VarChar => "VARCHAR",
            Self::LongVarChar => "LONGVARCHAR",
            Self::NChar => "NCHAR",
            Self::NVarChar => "NVARCHAR",
            Self::LongNVarChar => "LONGNVARCHAR",
            Self::Clob => "CLOB",
            Self::NClob => "NCLOB",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampWithTimezone => "TIMESTAMP_WITH_TIMEZONE",
            Self::Binary => "BINARY",
            Self::VarBinary => "VARBINARY",
            Self::LongVarBinary => "LONGVARBINARY",
            Self::Blob => "BLOB",
            Self::Uuid => "UUID",
        }
    }

    /// Resolve a type name as drivers and entity sources spell it.
    ///
    /// Case-insensitive; surrounding whitespace and a trailing size/precision
    /// suffix such as `(255)` or `(10,2)` are ignored.
    pub fn from_name(name: &str) -> Option<SqlType> {
        let base = name.split('(').next().unwrap_or_default().trim();
        let normalized = base
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        let sql_type = match normalized.as_str() {
            "NULL" => Self::Null,
            "BIT" => Self::Bit,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "TINYINT" | "INT1" => Self::TinyInt,
            "SMALLINT" | "INT2" | "SMALLSERIAL" => Self::SmallInt,
            "INTEGER" | "INT" | "INT4" | "MEDIUMINT" | "SERIAL" => Self::Integer,
            "BIGINT" | "INT8" | "BIGSERIAL" => Self::BigInt,
            "REAL" | "FLOAT4" => Self::Real,
            "FLOAT" => Self::Float,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => Self::Double,
            "NUMERIC" | "NUMBER" => Self::Numeric,
            "DECIMAL" | "DEC" | "MONEY" => Self::Decimal,
            "CHAR" | "CHARACTER" => Self::Char,
            "VARCHAR" | "CHARACTER VARYING" | "VARCHAR2" | "STRING" => Self::VarChar,
            "LONGVARCHAR" | "TEXT" | "LONGTEXT" | "MEDIUMTEXT" => Self::LongVarChar,
            "NCHAR" => Self::NChar,
            "NVARCHAR" | "NVARCHAR2" => Self::NVarChar,
            "LONGNVARCHAR" => Self::LongNVarChar,
            "CLOB" => Self::Clob,
            "NCLOB" => Self::NClob,
            "DATE" => Self::Date,
            "TIME" | "TIME WITHOUT TIME ZONE" => Self::Time,
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP WITHOUT TIME ZONE" => Self::Timestamp,
            "TIMESTAMP_WITH_TIMEZONE" | "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => {
                Self::TimestampWithTimezone
            }
            "BINARY" => Self::Binary,
            "VARBINARY" | "BYTEA" => Self::VarBinary,
            "LONGVARBINARY" | "IMAGE" => Self::LongVarBinary,
            "BLOB" | "LONGBLOB" => Self::Blob,
            "UUID" | "UNIQUEIDENTIFIER" => Self::Uuid,
            _ => return None,
        };

        Some(sql_type)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::Timestamp | Self::TimestampWithTimezone
        )
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_name() {
        for sql_type in SqlType::ALL {
            assert_eq!(SqlType::from_name(sql_type.name()), Some(*sql_type));
        }
    }

    #[test]
    fn test_from_name_is_case_insensitive_and_ignores_size() {
        assert_eq!(SqlType::from_name("varchar(255)"), Some(SqlType::VarChar));
        assert_eq!(SqlType::from_name("  Decimal(10, 2) "), Some(SqlType::Decimal));
        assert_eq!(
            SqlType::from_name("double   precision"),
            Some(SqlType::Double)
        );
        assert_eq!(SqlType::from_name("GEOMETRY"), None);
    }
}
