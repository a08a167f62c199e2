//! Per-type binding strategies.
//!
//! Every SQL type except NULL is claimed by exactly one [`ParamSetter`]; the
//! claims are checked against [`SqlType::ALL`] in the tests below.

use bigdecimal::BigDecimal;
use num_traits::{ToPrimitive, Zero};
use uuid::Uuid;

use super::statement::BoundParam;
use crate::core::codec::{
    bytes_from_list, decimal_to_f64, decimal_to_i64_exact, decode_base64, float_to_decimal,
    float_to_i64_exact, is_integral, magnitude, parse_decimal,
};
use crate::core::temporal::{
    from_epoch_millis, parse_date_lenient, parse_time_lenient, parse_timestamp_lenient,
};
use crate::core::{MarshalError, Result, SqlType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSetter {
    Boolean,
    ShortInteger,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Text,
    Temporal,
    Binary,
    CharacterLob,
    Uuid,
}

impl ParamSetter {
    pub const ALL: [ParamSetter; 12] = [
        Self::Boolean,
        Self::ShortInteger,
        Self::Integer,
        Self::BigInt,
        Self::Real,
        Self::Double,
        Self::Decimal,
        Self::Text,
        Self::Temporal,
        Self::Binary,
        Self::CharacterLob,
        Self::Uuid,
    ];

    /// Whether this setter claims the given SQL type.
    pub fn applies_to(&self, sql_type: SqlType) -> bool {
        use SqlType as T;
        match self {
            Self::Boolean => matches!(sql_type, T::Bit | T::Boolean),
            Self::ShortInteger => matches!(sql_type, T::TinyInt | T::SmallInt),
            Self::Integer => sql_type == T::Integer,
            Self::BigInt => sql_type == T::BigInt,
            Self::Real => sql_type == T::Real,
            Self::Double => matches!(sql_type, T::Float | T::Double),
            Self::Decimal => matches!(sql_type, T::Numeric | T::Decimal),
            Self::Text => matches!(
                sql_type,
                T::Char | T::VarChar | T::LongVarChar | T::NChar | T::NVarChar | T::LongNVarChar
            ),
            Self::Temporal => matches!(
                sql_type,
                T::Date | T::Time | T::Timestamp | T::TimestampWithTimezone
            ),
            Self::Binary => matches!(
                sql_type,
                T::Binary | T::VarBinary | T::LongVarBinary | T::Blob
            ),
            Self::CharacterLob => matches!(sql_type, T::Clob | T::NClob),
            Self::Uuid => sql_type == T::Uuid,
        }
    }

    /// The one setter claiming `sql_type`.
    pub fn for_type(sql_type: SqlType) -> Result<Self> {
        let mut claims = Self::ALL.iter().filter(|setter| setter.applies_to(sql_type));
        match (claims.next(), claims.next()) {
            (Some(setter), None) => Ok(*setter),
            (None, _) => Err(MarshalError::binding(format!(
                "No parameter setter applies to type {}",
                sql_type
            ))),
            (Some(_), Some(_)) => Err(MarshalError::binding(format!(
                "Ambiguous parameter setters for type {}",
                sql_type
            ))),
        }
    }

    /// Resolve a database type name (case-insensitive) to its setter.
    pub fn resolve(type_name: &str) -> Result<(SqlType, Self)> {
        let sql_type = SqlType::from_name(type_name).ok_or_else(|| {
            MarshalError::binding(format!("Unknown database type '{}'", type_name))
        })?;
        Ok((sql_type, Self::for_type(sql_type)?))
    }

    /// Convert a non-null value into the parameter for `sql_type`.
    pub fn to_param(&self, sql_type: SqlType, value: &Value) -> Result<BoundParam> {
        match self {
            Self::Boolean => Ok(BoundParam::Boolean(truthy(value))),
            Self::ShortInteger => {
                let n = integral(sql_type, value)?;
                if sql_type == SqlType::TinyInt {
                    narrow(sql_type, value, n).map(BoundParam::TinyInt)
                } else {
                    narrow(sql_type, value, n).map(BoundParam::SmallInt)
                }
            }
            Self::Integer => {
                let n = integral(sql_type, value)?;
                narrow(sql_type, value, n).map(BoundParam::Integer)
            }
            Self::BigInt => integral(sql_type, value).map(BoundParam::BigInt),
            Self::Real => floating(sql_type, value)
                .map(|f| f as f32)
                .map(BoundParam::Real),
            Self::Double => floating(sql_type, value).map(BoundParam::Double),
            Self::Decimal => decimal(sql_type, value).map(BoundParam::Decimal),
            Self::Text => text(sql_type, value).map(BoundParam::Text),
            Self::Temporal => temporal(sql_type, value),
            Self::Binary => {
                let bytes = binary(sql_type, value)?;
                Ok(BoundParam::BinaryStream {
                    length: bytes.len(),
                    bytes,
                })
            }
            Self::CharacterLob => {
                let text = character_lob(sql_type, value)?;
                Ok(BoundParam::CharacterStream {
                    length: text.chars().count(),
                    text,
                })
            }
            Self::Uuid => uuid(sql_type, value).map(BoundParam::Uuid),
        }
    }
}

fn cannot_bind(sql_type: SqlType, value: &Value, reason: &str) -> MarshalError {
    MarshalError::binding(format!(
        "Cannot bind {} value '{}' as {}: {}",
        value.type_name(),
        value,
        sql_type,
        reason
    ))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::BigInteger(b) => !b.is_zero(),
        Value::Float(f) => *f != 0.0,
        Value::Decimal(d) => !d.is_zero(),
        Value::Text(s) | Value::Clob(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Exact integer out of a value; decimal literals like `30.000` are accepted.
fn integral(sql_type: SqlType, value: &Value) -> Result<i64> {
    let exact = match value {
        Value::Integer(i) => Some(*i),
        Value::BigInteger(b) => b.to_i64(),
        Value::Float(f) => float_to_i64_exact(*f),
        Value::Decimal(d) => decimal_to_i64_exact(d),
        Value::Boolean(b) => Some(i64::from(*b)),
        Value::Text(s) => {
            let parsed = parse_decimal(s).map_err(|err| {
                MarshalError::binding_caused_by(
                    format!("Cannot bind '{}' as {}: not a number", s, sql_type),
                    err,
                )
            })?;
            if is_integral(&parsed) && magnitude(&parsed) > 18 {
                return Err(cannot_bind(sql_type, value, "out of range"));
            }
            decimal_to_i64_exact(&parsed)
        }
        _ => return Err(cannot_bind(sql_type, value, "unsupported value")),
    };

    exact.ok_or_else(|| cannot_bind(sql_type, value, "not an exact integer"))
}

fn narrow<T: TryFrom<i64>>(sql_type: SqlType, value: &Value, n: i64) -> Result<T> {
    T::try_from(n).map_err(|_| cannot_bind(sql_type, value, "out of range"))
}

fn floating(sql_type: SqlType, value: &Value) -> Result<f64> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::BigInteger(b) => b
            .to_f64()
            .ok_or_else(|| cannot_bind(sql_type, value, "out of range")),
        Value::Decimal(d) => decimal_to_f64(d)
            .ok_or_else(|| cannot_bind(sql_type, value, "out of range")),
        Value::Text(s) => s.trim().parse::<f64>().map_err(|err| {
            MarshalError::binding_caused_by(
                format!("Cannot bind '{}' as {}: not a number", s, sql_type),
                err,
            )
        }),
        _ => Err(cannot_bind(sql_type, value, "unsupported value")),
    }
}

fn decimal(sql_type: SqlType, value: &Value) -> Result<BigDecimal> {
    match value {
        Value::Decimal(d) => Ok(d.clone()),
        Value::Integer(i) => Ok(BigDecimal::from(*i)),
        Value::BigInteger(b) => Ok(BigDecimal::from(b.clone())),
        Value::Float(f) => {
            float_to_decimal(*f).ok_or_else(|| cannot_bind(sql_type, value, "not a finite number"))
        }
        Value::Text(s) => parse_decimal(s).map_err(|err| {
            MarshalError::binding_caused_by(
                format!("Cannot bind '{}' as {}: not a decimal number", s, sql_type),
                err,
            )
        }),
        _ => Err(cannot_bind(sql_type, value, "unsupported value")),
    }
}

/// Trim, then drop one pair of matching enclosing quotes.
pub(crate) fn unquote(s: &str) -> &str {
    let trimmed = s.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

fn text(sql_type: SqlType, value: &Value) -> Result<String> {
    match value {
        Value::Text(s) | Value::Clob(s) => Ok(unquote(s).to_string()),
        Value::Bytes(_) | Value::Blob(_) => Err(cannot_bind(sql_type, value, "binary content")),
        other => Ok(other.to_string()),
    }
}

fn temporal(sql_type: SqlType, value: &Value) -> Result<BoundParam> {
    if let Value::Text(s) = value {
        if s.trim().is_empty() {
            return Ok(BoundParam::Null(sql_type));
        }
    }

    let timestamp = match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::Date(d) => d.and_hms_opt(0, 0, 0),
        Value::Integer(millis) => from_epoch_millis(*millis),
        Value::Text(s) if sql_type == SqlType::Time => {
            return parse_time_lenient(s)
                .map(BoundParam::Time)
                .ok_or_else(|| cannot_bind(sql_type, value, "not a time"));
        }
        Value::Time(t) if sql_type == SqlType::Time => return Ok(BoundParam::Time(*t)),
        Value::Text(s) if sql_type == SqlType::Date => {
            return parse_date_lenient(s)
                .map(BoundParam::Date)
                .ok_or_else(|| cannot_bind(sql_type, value, "not a date"));
        }
        Value::Text(s) => parse_timestamp_lenient(s),
        _ => None,
    }
    .ok_or_else(|| cannot_bind(sql_type, value, "not a timestamp"))?;

    Ok(match sql_type {
        SqlType::Date => BoundParam::Date(timestamp.date()),
        SqlType::Time => BoundParam::Time(timestamp.time()),
        _ => BoundParam::Timestamp(timestamp),
    })
}

fn binary(sql_type: SqlType, value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Bytes(bytes) | Value::Blob(bytes) => Ok(bytes.clone()),
        Value::Text(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::Text(s) => {
            decode_base64(s).ok_or_else(|| cannot_bind(sql_type, value, "invalid base64"))
        }
        Value::List(items) => {
            bytes_from_list(items).ok_or_else(|| cannot_bind(sql_type, value, "not a byte list"))
        }
        _ => Err(cannot_bind(sql_type, value, "unsupported value")),
    }
}

/// Text payloads arrive base64-encoded; already-typed CLOB values bind as-is.
fn character_lob(sql_type: SqlType, value: &Value) -> Result<String> {
    match value {
        Value::Clob(text) => Ok(text.clone()),
        Value::Text(s) if s.trim().is_empty() => Ok(String::new()),
        Value::Text(s) => {
            let bytes =
                decode_base64(s).ok_or_else(|| cannot_bind(sql_type, value, "invalid base64"))?;
            String::from_utf8(bytes).map_err(|err| {
                MarshalError::binding_caused_by(
                    format!("Cannot bind '{}' as {}: decoded content is not UTF-8", s, sql_type),
                    err,
                )
            })
        }
        Value::Bytes(bytes) | Value::Blob(bytes) => String::from_utf8(bytes.clone())
            .map_err(|err| {
                MarshalError::binding_caused_by(
                    format!("Cannot bind {} bytes as {}: not UTF-8", bytes.len(), sql_type),
                    err,
                )
            }),
        _ => Err(cannot_bind(sql_type, value, "unsupported value")),
    }
}

fn uuid(sql_type: SqlType, value: &Value) -> Result<Uuid> {
    match value {
        Value::Uuid(u) => Ok(*u),
        Value::Text(s) => Uuid::parse_str(unquote(s)).map_err(|err| {
            MarshalError::binding_caused_by(
                format!("Cannot bind '{}' as {}: not a UUID", s, sql_type),
                err,
            )
        }),
        _ => Err(cannot_bind(sql_type, value, "unsupported value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_setters_partition_sql_types() {
        let mut claimed = HashSet::new();
        for sql_type in SqlType::ALL.iter().copied() {
            let claims = ParamSetter::ALL
                .iter()
                .filter(|setter| setter.applies_to(sql_type))
                .count();
            if sql_type == SqlType::Null {
                assert_eq!(claims, 0);
            } else {
                assert_eq!(claims, 1, "{} claimed {} times", sql_type, claims);
                claimed.insert(sql_type);
            }
        }
        assert_eq!(claimed.len(), SqlType::ALL.len() - 1);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(ParamSetter::resolve("varchar").unwrap().1, ParamSetter::Text);
        assert_eq!(ParamSetter::resolve("BIGINT").unwrap().1, ParamSetter::BigInt);
        assert!(ParamSetter::resolve("NULL").is_err());
        assert!(ParamSetter::resolve("GEOMETRY").is_err());
    }

    #[test]
    fn test_integer_accepts_exact_decimal_literals() {
        let param = ParamSetter::Integer
            .to_param(SqlType::Integer, &Value::from("30.000"))
            .unwrap();
        assert_eq!(param, BoundParam::Integer(30));

        let err = ParamSetter::Integer
            .to_param(SqlType::Integer, &Value::from("30.5"))
            .unwrap_err();
        assert!(err.is_binding());
        assert!(err.to_string().contains("30.5"));

        assert!(ParamSetter::ShortInteger
            .to_param(SqlType::TinyInt, &Value::Integer(300))
            .is_err());
    }

    #[test]
    fn test_integer_rejects_huge_exponent_literals() {
        for literal in ["1e999999999", "-1E999999999", "99999999999999999999"] {
            let err = ParamSetter::Integer
                .to_param(SqlType::Integer, &Value::from(literal))
                .unwrap_err();
            assert!(err.is_binding());
            assert!(err.to_string().contains("out of range"), "{}", err);
        }

        let err = ParamSetter::BigInt
            .to_param(SqlType::BigInt, &Value::from("1e-999999999"))
            .unwrap_err();
        assert!(err.to_string().contains("not an exact integer"));

        assert!(ParamSetter::Double
            .to_param(SqlType::Double, &Value::Decimal(parse_decimal("1e999999999").unwrap()))
            .is_err());
    }

    #[test]
    fn test_boolean_truthiness() {
        let bind = |value: Value| ParamSetter::Boolean.to_param(SqlType::Boolean, &value).unwrap();
        assert_eq!(bind(Value::from("TRUE")), BoundParam::Boolean(true));
        assert_eq!(bind(Value::from("yes")), BoundParam::Boolean(false));
        assert_eq!(bind(Value::Integer(2)), BoundParam::Boolean(true));
        assert_eq!(bind(Value::Float(0.0)), BoundParam::Boolean(false));
    }

    #[test]
    fn test_text_strips_one_pair_of_quotes() {
        assert_eq!(unquote("  'M%' "), "M%");
        assert_eq!(unquote("\"\"x\"\""), "\"x\"");
        assert_eq!(unquote("'mixed\""), "'mixed\"");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_temporal_empty_string_is_null() {
        assert_eq!(
            ParamSetter::Temporal
                .to_param(SqlType::Timestamp, &Value::from(" "))
                .unwrap(),
            BoundParam::Null(SqlType::Timestamp)
        );
        assert!(matches!(
            ParamSetter::Temporal
                .to_param(SqlType::Date, &Value::from("2024-01-15T10:00:00"))
                .unwrap(),
            BoundParam::Date(_)
        ));
    }

    #[test]
    fn test_lob_setters_decode_base64() {
        assert_eq!(
            ParamSetter::Binary
                .to_param(SqlType::Blob, &Value::from("aGVsbG8="))
                .unwrap(),
            BoundParam::BinaryStream {
                bytes: b"hello".to_vec(),
                length: 5
            }
        );
        assert_eq!(
            ParamSetter::CharacterLob
                .to_param(SqlType::Clob, &Value::from("aGVsbG8="))
                .unwrap(),
            BoundParam::CharacterStream {
                text: "hello".into(),
                length: 5
            }
        );
    }

    #[test]
    fn test_decimal_failure_embeds_literal() {
        let err = ParamSetter::Decimal
            .to_param(SqlType::Decimal, &Value::from("12.3.4"))
            .unwrap_err();
        assert!(err.to_string().contains("'12.3.4'"));
        assert!(err.to_string().contains("DECIMAL"));
    }
}
