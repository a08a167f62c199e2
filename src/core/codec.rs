//! Numeric and binary detection helpers shared by the normalizer and the binder.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bigdecimal::{BigDecimal, ParseBigDecimalError};
use num_traits::{ToPrimitive, Zero};

use super::Value;

// 2^63 as f64; every f64 strictly below it (and >= -2^63) fits an i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Integral floats within the `i64` range convert exactly.
pub fn float_to_i64_exact(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= -I64_BOUND && f < I64_BOUND {
        Some(f as i64)
    } else {
        None
    }
}

/// Decimal from the shortest decimal representation of the float.
pub fn float_to_decimal(f: f64) -> Option<BigDecimal> {
    if !f.is_finite() {
        return None;
    }
    BigDecimal::from_str(&f.to_string()).ok()
}

pub fn parse_decimal(literal: &str) -> Result<BigDecimal, ParseBigDecimalError> {
    BigDecimal::from_str(literal.trim())
}

pub fn is_integral(d: &BigDecimal) -> bool {
    let (_, scale) = d.normalized().as_bigint_and_exponent();
    scale <= 0
}

/// Power of ten of the leading digit: `12.5` is 1, `0.03` is -2, zero is 0.
///
/// Computed from the digit count and scale, so it never expands the value.
pub fn magnitude(d: &BigDecimal) -> i64 {
    if d.is_zero() {
        return 0;
    }
    let (_, scale) = d.as_bigint_and_exponent();
    (d.digits() as i64).saturating_sub(scale).saturating_sub(1)
}

/// `Some` only when the decimal has no fractional part and fits an `i64`.
pub fn decimal_to_i64_exact(d: &BigDecimal) -> Option<i64> {
    // i64::MAX has 19 digits
    if !is_integral(d) || magnitude(d) > 18 {
        return None;
    }
    d.to_i64()
}

/// Nearest `f64`; `None` outside the `f64` exponent range.
pub fn decimal_to_f64(d: &BigDecimal) -> Option<f64> {
    if !(-330..=308).contains(&magnitude(d)) {
        return None;
    }
    d.to_f64().filter(|f| f.is_finite())
}

/// Strict base64: non-empty, padded to a multiple of four, standard alphabet.
pub fn decode_base64(s: &str) -> Option<Vec<u8>> {
    let s = s.trim();
    if s.is_empty() || s.len() % 4 != 0 {
        return None;
    }
    BASE64.decode(s).ok()
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Byte sequence out of a list of byte-valued integers.
///
/// Accepts both unsigned (0..=255) and signed (-128..=-1) byte values.
pub fn bytes_from_list(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| match item {
            Value::Integer(i) if (0..=255).contains(i) => Some(*i as u8),
            Value::Integer(i) if (-128..0).contains(i) => Some(*i as i8 as u8),
            Value::Float(f) => float_to_i64_exact(*f)
                .filter(|i| (-128..=255).contains(i))
                .map(|i| i as i8 as u8),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_to_i64_exact() {
        assert_eq!(float_to_i64_exact(30.0), Some(30));
        assert_eq!(float_to_i64_exact(-2.0), Some(-2));
        assert_eq!(float_to_i64_exact(180.5), None);
        assert_eq!(float_to_i64_exact(1e19), None);
        assert_eq!(float_to_i64_exact(f64::NAN), None);
    }

    #[test]
    fn test_decimal_exactness() {
        assert_eq!(decimal_to_i64_exact(&parse_decimal("30.000").unwrap()), Some(30));
        assert_eq!(decimal_to_i64_exact(&parse_decimal("1E+3").unwrap()), Some(1000));
        assert_eq!(decimal_to_i64_exact(&parse_decimal("30.5").unwrap()), None);
        assert_eq!(
            decimal_to_i64_exact(&parse_decimal("99999999999999999999").unwrap()),
            None
        );
    }

    #[test]
    fn test_huge_exponents_are_rejected_without_expansion() {
        let huge = parse_decimal("1e999999999").unwrap();
        assert_eq!(magnitude(&huge), 999_999_999);
        assert_eq!(decimal_to_i64_exact(&huge), None);
        assert_eq!(decimal_to_f64(&huge), None);

        let tiny = parse_decimal("1e-999999999").unwrap();
        assert_eq!(decimal_to_i64_exact(&tiny), None);
        assert_eq!(decimal_to_f64(&tiny), None);

        assert_eq!(magnitude(&parse_decimal("12.5").unwrap()), 1);
        assert_eq!(magnitude(&parse_decimal("0.03").unwrap()), -2);
        assert_eq!(
            decimal_to_i64_exact(&parse_decimal("-9223372036854775808").unwrap()),
            Some(i64::MIN)
        );
        assert_eq!(decimal_to_f64(&parse_decimal("2.5").unwrap()), Some(2.5));
    }

    #[test]
    fn test_base64_is_strict() {
        assert_eq!(decode_base64("aGVsbG8="), Some(b"hello".to_vec()));
        assert_eq!(decode_base64("hello"), None);
        assert_eq!(decode_base64(""), None);
    }

    #[test]
    fn test_bytes_from_signed_and_unsigned_list() {
        let items = vec![Value::Integer(0), Value::Integer(255), Value::Integer(-1)];
        assert_eq!(bytes_from_list(&items), Some(vec![0, 255, 255]));
        assert_eq!(bytes_from_list(&[Value::Integer(256)]), None);
        assert_eq!(bytes_from_list(&[Value::Text("1".into())]), None);
    }
}
