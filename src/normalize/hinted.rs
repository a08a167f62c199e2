//! Coercions driven by a declared column type.
//!
//! A hint is a contract: input that cannot be read as the hinted type is an
//! error rather than a silent pass-through.

use num_traits::ToPrimitive;
use uuid::Uuid;

use crate::core::codec::{bytes_from_list, decode_base64, float_to_decimal, float_to_i64_exact, parse_decimal};
use crate::core::temporal::{
    from_epoch_millis, parse_date_lenient, parse_time_lenient, parse_timestamp_lenient,
};
use crate::core::{MarshalError, Result, Value};
use crate::mapping::type_map::resolve_type;

/// Coercion selected by a column type hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Coercion {
    Timestamp,
    Date,
    Time,
    Decimal,
    Uuid,
    Binary,
    Clob,
}

impl Coercion {
    /// `None` for hints without a dedicated coercion; those use the heuristics.
    pub fn for_hint(hint: &str) -> Option<Self> {
        match resolve_type(hint).as_str() {
            "timestamp" => Some(Self::Timestamp),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "big_decimal" => Some(Self::Decimal),
            "uuid-char" => Some(Self::Uuid),
            "blob" | "binary" => Some(Self::Binary),
            "clob" => Some(Self::Clob),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Time => "time",
            Self::Decimal => "decimal",
            Self::Uuid => "uuid",
            Self::Binary => "binary",
            Self::Clob => "clob",
        }
    }

    /// Coerce `value` in place. Nulls are always accepted.
    pub fn apply(&self, entity: &str, field: &str, value: &mut Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }

        let coerced = match self {
            Self::Timestamp => coerce_timestamp(value),
            Self::Date => coerce_timestamp(value).map(|ts| match ts {
                Value::Timestamp(ts) => Value::Date(ts.date()),
                other => other,
            }),
            Self::Time => coerce_time(value),
            Self::Decimal => return coerce_decimal(entity, field, value),
            Self::Uuid => return coerce_uuid(entity, field, value),
            Self::Binary => coerce_binary(value),
            Self::Clob => match value {
                Value::Text(s) => Some(Value::Clob(std::mem::take(s))),
                Value::Clob(_) => return Ok(()),
                _ => None,
            },
        };

        match coerced {
            Some(coerced) => {
                *value = coerced;
                Ok(())
            }
            None => Err(self.mismatch(entity, field, value)),
        }
    }

    fn mismatch(&self, entity: &str, field: &str, value: &Value) -> MarshalError {
        MarshalError::normalization(
            entity,
            field,
            format!(
                "cannot read {} value '{}' as {}",
                value.type_name(),
                value,
                self.describe()
            ),
        )
    }
}

fn coerce_timestamp(value: &Value) -> Option<Value> {
    match value {
        Value::Timestamp(_) => Some(value.clone()),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).map(Value::Timestamp),
        Value::Text(s) if s.trim().is_empty() => Some(Value::Null),
        Value::Text(s) => parse_timestamp_lenient(s).map(Value::Timestamp),
        Value::Integer(millis) => from_epoch_millis(*millis).map(Value::Timestamp),
        Value::Float(f) => float_to_i64_exact(*f)
            .and_then(from_epoch_millis)
            .map(Value::Timestamp),
        _ => None,
    }
}

fn coerce_time(value: &Value) -> Option<Value> {
    match value {
        Value::Time(_) => Some(value.clone()),
        Value::Timestamp(ts) => Some(Value::Time(ts.time())),
        Value::Text(s) if s.trim().is_empty() => Some(Value::Null),
        Value::Text(s) => parse_time_lenient(s).map(Value::Time),
        _ => None,
    }
}

fn coerce_decimal(entity: &str, field: &str, value: &mut Value) -> Result<()> {
    let decimal = match value {
        Value::Decimal(_) => return Ok(()),
        Value::Integer(i) => bigdecimal::BigDecimal::from(*i),
        Value::BigInteger(b) => bigdecimal::BigDecimal::from(b.clone()),
        Value::Float(f) => float_to_decimal(*f).ok_or_else(|| {
            MarshalError::normalization(entity, field, format!("cannot read '{}' as decimal", f))
        })?,
        Value::Text(s) => parse_decimal(s).map_err(|err| {
            MarshalError::normalization_caused_by(
                entity,
                field,
                format!("cannot read '{}' as decimal", s),
                err,
            )
        })?,
        other => {
            return Err(MarshalError::normalization(
                entity,
                field,
                format!("cannot read {} value '{}' as decimal", other.type_name(), other),
            ));
        }
    };

    *value = Value::Decimal(decimal);
    Ok(())
}

fn coerce_uuid(entity: &str, field: &str, value: &mut Value) -> Result<()> {
    let uuid = match value {
        Value::Uuid(_) => return Ok(()),
        Value::Text(s) => Uuid::parse_str(s.trim()).map_err(|err| {
            MarshalError::normalization_caused_by(
                entity,
                field,
                format!("cannot read '{}' as uuid", s),
                err,
            )
        })?,
        Value::BigInteger(b) => b
            .to_u128()
            .map(Uuid::from_u128)
            .ok_or_else(|| {
                MarshalError::normalization(entity, field, format!("cannot read '{}' as uuid", b))
            })?,
        other => {
            return Err(MarshalError::normalization(
                entity,
                field,
                format!("cannot read {} value '{}' as uuid", other.type_name(), other),
            ));
        }
    };

    *value = Value::Uuid(uuid);
    Ok(())
}

fn coerce_binary(value: &Value) -> Option<Value> {
    match value {
        Value::Blob(_) => Some(value.clone()),
        Value::Bytes(bytes) => Some(Value::Blob(bytes.clone())),
        Value::Text(s) if s.is_empty() => Some(Value::Blob(Vec::new())),
        Value::Text(s) => decode_base64(s).map(Value::Blob),
        Value::List(items) => bytes_from_list(items).map(Value::Blob),
        _ => None,
    }
}
