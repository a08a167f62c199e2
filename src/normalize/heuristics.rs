//! Schema-free coercions.
//!
//! Every rule here is best effort: when a value looks like something but does
//! not parse as it, the value is left exactly as it was.

use log::warn;
use num_traits::ToPrimitive;

use crate::config::MarshalConfig;
use crate::core::codec::{decimal_to_i64_exact, decode_base64, float_to_decimal, float_to_i64_exact};
use crate::core::temporal::{
    looks_like_date, looks_like_date_time, looks_like_time, parse_date, parse_time,
    parse_timestamp,
};
use crate::core::{Record, Value};

/// Normalize every entry of a record, recursing into nested maps and lists.
pub(crate) fn normalize_record(config: &MarshalConfig, record: &mut Record) {
    for (property, value) in record.iter_mut() {
        normalize_value(config, property, value);
    }
}

/// Normalize one value; `property` is the key it is stored under.
///
/// List elements inherit the property name of their list.
pub(crate) fn normalize_value(config: &MarshalConfig, property: &str, value: &mut Value) {
    let replacement = match value {
        Value::Map(record) => {
            normalize_record(config, record);
            None
        }
        Value::List(items) => {
            for item in items.iter_mut() {
                normalize_value(config, property, item);
            }
            None
        }
        Value::Float(f) => normalize_float(*f),
        Value::Decimal(d) => decimal_to_i64_exact(d).map(Value::Integer),
        Value::BigInteger(b) => b.to_i64().map(Value::Integer),
        Value::Text(s) => normalize_text(config, property, s),
        _ => None,
    };

    if let Some(replacement) = replacement {
        *value = replacement;
    }
}

/// Integral floats become integers; anything else finite becomes an exact decimal.
fn normalize_float(f: f64) -> Option<Value> {
    float_to_i64_exact(f)
        .map(Value::Integer)
        .or_else(|| float_to_decimal(f).map(Value::Decimal))
}

fn normalize_text(config: &MarshalConfig, property: &str, s: &str) -> Option<Value> {
    let trimmed = s.trim();

    if looks_like_date_time(trimmed) {
        return parse_timestamp(trimmed).map(Value::Timestamp).or_else(|| {
            warn!("Leaving '{}' as text: '{}' is not a valid date-time", property, s);
            None
        });
    }
    if looks_like_date(trimmed) {
        return parse_date(trimmed).map(Value::Date).or_else(|| {
            warn!("Leaving '{}' as text: '{}' is not a valid date", property, s);
            None
        });
    }
    if looks_like_time(trimmed) {
        return parse_time(trimmed).map(Value::Time).or_else(|| {
            warn!("Leaving '{}' as text: '{}' is not a valid time", property, s);
            None
        });
    }

    if config.hints_binary(property) {
        if let Some(bytes) = decode_base64(trimmed) {
            return Some(Value::Bytes(bytes));
        }
    }

    if config.hints_clob(property) && s.chars().count() > config.clob_length_threshold {
        return Some(Value::Clob(s.to_string()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, NaiveTime};
    use std::str::FromStr;

    fn normalized(property: &str, value: Value) -> Value {
        let mut value = value;
        normalize_value(&MarshalConfig::default(), property, &mut value);
        value
    }

    #[test]
    fn test_numbers() {
        assert_eq!(normalized("age", Value::Float(30.0)), Value::Integer(30));
        assert_eq!(
            normalized("height", Value::Float(180.5)),
            Value::Decimal(BigDecimal::from_str("180.5").unwrap())
        );
        assert_eq!(
            normalized("total", Value::Decimal(BigDecimal::from_str("12.000").unwrap())),
            Value::Integer(12)
        );
        assert!(matches!(normalized("huge", Value::Float(1e300)), Value::Decimal(_)));
        assert!(matches!(normalized("nan", Value::Float(f64::NAN)), Value::Float(_)));
    }

    #[test]
    fn test_temporal_strings() {
        assert_eq!(
            normalized("day", Value::from("2024-02-29")),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(
            normalized("at", Value::from("08:30:00")),
            Value::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap())
        );
        assert!(matches!(
            normalized("created", Value::from("2024-01-15T10:30:00Z")),
            Value::Timestamp(_)
        ));
    }

    #[test]
    fn test_malformed_temporal_is_left_alone() {
        assert_eq!(normalized("day", Value::from("2024-13-45")), Value::from("2024-13-45"));
        assert_eq!(normalized("at", Value::from("25:99")), Value::from("25:99"));
    }

    #[test]
    fn test_base64_requires_binary_property_name() {
        assert_eq!(
            normalized("imageData", Value::from("aGVsbG8=")),
            Value::Bytes(b"hello".to_vec())
        );
        assert_eq!(normalized("title", Value::from("aGVsbG8=")), Value::from("aGVsbG8="));
        assert_eq!(normalized("imageData", Value::from("not base64!")), Value::from("not base64!"));
    }

    #[test]
    fn test_long_clob_text_is_wrapped() {
        let long = "x".repeat(300);
        assert_eq!(normalized("bodyClob", Value::from(long.as_str())), Value::Clob(long.clone()));
        assert_eq!(normalized("bodyClob", Value::from("short")), Value::from("short"));
        assert_eq!(normalized("body", Value::from(long.as_str())), Value::from(long.as_str()));
    }

    #[test]
    fn test_nested_maps_and_lists() {
        let mut inner = Record::new();
        inner.insert("qty".into(), Value::Float(2.0));
        let value = Value::List(vec![Value::Map(inner), Value::Float(1.5)]);

        match normalized("items", value) {
            Value::List(items) => {
                assert_eq!(items[0].as_map().unwrap()["qty"], Value::Integer(2));
                assert!(matches!(items[1], Value::Decimal(_)));
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }
}
