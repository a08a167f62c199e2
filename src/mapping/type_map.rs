//! Two-tier type resolution: database type hint first, source annotation second.

use std::collections::HashMap;

use crate::core::SqlType;

lazy_static::lazy_static! {
    /// Canonical database type name -> persisted type name.
    static ref DATABASE_TYPES: HashMap<&'static str, &'static str> = {
        let entries: &[(&[&str], &str)] = &[
            (&["varchar", "char", "nvarchar", "nchar", "character", "character varying",
               "varchar2", "nvarchar2", "string", "text", "longvarchar", "longnvarchar"], "string"),
            (&["smallint", "tinyint", "int2", "short"], "short"),
            (&["integer", "int", "int4", "mediumint"], "integer"),
            (&["bigint", "int8", "long"], "long"),
            (&["real", "float4"], "float"),
            (&["float", "double", "double precision", "float8"], "double"),
            (&["decimal", "numeric", "number", "money", "big_decimal"], "big_decimal"),
            (&["boolean", "bool"], "boolean"),
            (&["bit"], "bit"),
            (&["date"], "date"),
            (&["time", "time without time zone"], "time"),
            (&["timestamp", "datetime", "timestamptz", "timestamp with time zone",
               "timestamp without time zone", "timestamp_with_timezone"], "timestamp"),
            (&["binary", "varbinary", "longvarbinary", "bytea"], "binary"),
            (&["blob", "longblob", "image"], "blob"),
            (&["clob", "nclob", "longtext", "mediumtext"], "clob"),
            (&["uuid", "uniqueidentifier"], "uuid-char"),
        ];

        let mut table = HashMap::new();
        for (names, persisted) in entries {
            for name in *names {
                table.insert(*name, *persisted);
            }
        }
        table
    };
}

/// Lower-cased hint without surrounding whitespace, inner runs of spaces or a size suffix.
fn normalize_hint(hint: &str) -> String {
    let base = hint.split('(').next().unwrap_or_default();
    base.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Persisted type for a database type hint.
///
/// Known names resolve through the canonical table, case-insensitively.
/// Unknown hints pass through (trimmed, lower-cased).
pub fn resolve_type(hint: &str) -> String {
    let normalized = normalize_hint(hint);
    DATABASE_TYPES
        .get(normalized.as_str())
        .map(|persisted| persisted.to_string())
        .unwrap_or(normalized)
}

pub fn is_known_hint(hint: &str) -> bool {
    DATABASE_TYPES.contains_key(normalize_hint(hint).as_str())
}

/// Coarse fallback from the source type annotation.
pub fn resolve_source_type(annotation: &str) -> &'static str {
    let head = annotation
        .split('|')
        .map(str::trim)
        .find(|part| !matches!(*part, "null" | "undefined" | ""))
        .unwrap_or_default();

    match head.to_ascii_lowercase().as_str() {
        "number" => "long",
        "string" => "string",
        "boolean" => "boolean",
        "date" => "timestamp",
        _ => "string",
    }
}

/// Hint when present and non-blank, otherwise the source annotation.
pub fn resolve_persisted_type(hint: Option<&str>, source_type: &str) -> String {
    match hint.filter(|hint| !hint.trim().is_empty()) {
        Some(hint) => resolve_type(hint),
        None => resolve_source_type(source_type).to_string(),
    }
}

/// SQL parameter type for a persisted type name; unknown names bind as text.
pub fn persisted_sql_type(persisted: &str) -> SqlType {
    match persisted {
        "string" | "uuid-char" => SqlType::VarChar,
        "text" => SqlType::LongVarChar,
        "character" => SqlType::Char,
        "byte" => SqlType::TinyInt,
        "short" => SqlType::SmallInt,
        "integer" => SqlType::Integer,
        "long" => SqlType::BigInt,
        "float" => SqlType::Real,
        "double" => SqlType::Double,
        "big_decimal" | "big_integer" => SqlType::Decimal,
        "boolean" => SqlType::Boolean,
        "bit" => SqlType::Bit,
        "date" => SqlType::Date,
        "time" => SqlType::Time,
        "timestamp" => SqlType::Timestamp,
        "binary" => SqlType::VarBinary,
        "blob" => SqlType::Blob,
        "clob" => SqlType::Clob,
        _ => SqlType::VarChar,
    }
}
