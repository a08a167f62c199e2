use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use uuid::Uuid;

use super::{codec, temporal};

/// Generic record: string keys to loosely typed values, iterated in key order.
pub type Record = BTreeMap<String, Value>;

/// Dynamically typed value flowing between generic records and SQL parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    BigInteger(BigInt),
    Float(f64),
    Decimal(BigDecimal),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Uuid(Uuid),
    /// Binary large object.
    Blob(Vec<u8>),
    /// Character large object.
    Clob(String),
    List(Vec<Value>),
    Map(Record),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::BigInteger(_) => "BIGINTEGER",
            Self::Float(_) => "FLOAT",
            Self::Decimal(_) => "DECIMAL",
            Self::Text(_) => "TEXT",
            Self::Bytes(_) => "BYTES",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::Uuid(_) => "UUID",
            Self::Blob(_) => "BLOB",
            Self::Clob(_) => "CLOB",
            Self::List(_) => "LIST",
            Self::Map(_) => "MAP",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer(_) | Self::BigInteger(_) | Self::Float(_) | Self::Decimal(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Clob(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::BigInteger(b) => b.to_i64(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert a JSON document into a generic value.
    ///
    /// Integral JSON numbers become `Integer` (or `BigInteger` past `i64`),
    /// everything else numeric becomes `Float`. Strings stay text: typing them
    /// is the normalizer's job.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Self::BigInteger(BigInt::from(u))
                } else {
                    n.as_f64().map(Self::Float).unwrap_or(Self::Null)
                }
            }
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(obj) => Self::Map(record_from_json(obj)),
        }
    }

    /// Render the value for external delivery.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Boolean(b) => JsonValue::Bool(*b),
            Self::Integer(i) => JsonValue::from(*i),
            Self::BigInteger(b) => match (b.to_i64(), b.to_u64()) {
                (Some(i), _) => JsonValue::from(i),
                (None, Some(u)) => JsonValue::from(u),
                _ => JsonValue::String(b.to_string()),
            },
            Self::Float(f) => JsonNumber::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Decimal(d) => decimal_to_json(d),
            Self::Text(s) | Self::Clob(s) => JsonValue::String(s.clone()),
            Self::Bytes(b) | Self::Blob(b) => JsonValue::String(BASE64.encode(b)),
            Self::Timestamp(ts) => JsonValue::String(temporal::format_timestamp(ts)),
            Self::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => JsonValue::String(temporal::format_time(t)),
            Self::Uuid(u) => JsonValue::String(u.to_string()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(record) => JsonValue::Object(record_to_json(record)),
        }
    }
}

pub fn record_from_json(obj: &JsonMap<String, JsonValue>) -> Record {
    obj.iter()
        .map(|(key, value)| (key.clone(), Value::from_json(value)))
        .collect()
}

pub fn record_to_json(record: &Record) -> JsonMap<String, JsonValue> {
    record
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

/// Decimals go out as JSON numbers only when `f64` carries them exactly.
fn decimal_to_json(d: &BigDecimal) -> JsonValue {
    let exact = codec::decimal_to_f64(d)
        .and_then(|f| BigDecimal::from_str(&f.to_string()).ok().map(|back| (f, back)))
        .filter(|(_, back)| back == d);

    match exact.and_then(|(f, _)| JsonNumber::from_f64(f)) {
        Some(number) => JsonValue::Number(number),
        None => JsonValue::String(d.to_string()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::BigInteger(b) => write!(f, "{}", b),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::Text(s) | Self::Clob(s) => write!(f, "{}", s),
            Self::Bytes(b) | Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Self::Timestamp(ts) => write!(f, "{}", temporal::format_timestamp(ts)),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", temporal::format_time(t)),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Map(record)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_integers_and_floats_apart() {
        assert_eq!(Value::from_json(&json!(30)), Value::Integer(30));
        assert_eq!(Value::from_json(&json!(30.0)), Value::Float(30.0));
        assert_eq!(
            Value::from_json(&json!(u64::MAX)),
            Value::BigInteger(BigInt::from(u64::MAX))
        );
    }

    #[test]
    fn test_nested_json_becomes_map_and_list() {
        let value = Value::from_json(&json!({"tags": ["a", "b"], "owner": {"id": 1}}));
        let Value::Map(record) = value else {
            panic!("expected map");
        };
        assert_eq!(
            record["tags"],
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(record["owner"].as_map().unwrap()["id"], Value::Integer(1));
    }

    #[test]
    fn test_to_json_renders_delivery_forms() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_json(), json!("2024-05-17T10:30:00"));
        assert_eq!(Value::Blob(b"hi".to_vec()).to_json(), json!("aGk="));
        assert_eq!(
            Value::Decimal(BigDecimal::from_str("180.5").unwrap()).to_json(),
            json!(180.5)
        );
        assert_eq!(
            Value::Decimal(BigDecimal::from_str("12345678901234567890.123").unwrap()).to_json(),
            json!("12345678901234567890.123")
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }
}
