//! Monetary amounts as they arrive from stored documents
//!
//! Documents written by the dashboard carry amounts either as JSON numbers or
//! as form strings ("120.50"). `Amount` keeps the raw value so it is written
//! back unchanged, and offers a lenient and a strict numeric reading.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Value);

impl Amount {
    pub fn new(value: f64) -> Self {
        Self(serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number))
    }

    /// Wrap an arbitrary stored value
    pub fn from_raw(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_null()
    }

    /// Numeric reading that never fails.
    ///
    /// Strings are read up to the first character that cannot continue a
    /// decimal literal ("12.5 EUR" reads as 12.5); anything unreadable is 0.
    pub fn lenient(&self) -> f64 {
        lenient_number(&self.0)
    }

    /// Numeric reading that rejects anything but a clean, finite number
    pub fn strict(&self) -> Option<f64> {
        strict_number(&self.0)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

/// Lenient numeric coercion of a JSON value, falling back to 0
pub fn lenient_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal_prefix(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Strict numeric reading of a JSON value
pub fn strict_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Parse the longest leading decimal literal of `input`
fn parse_decimal_prefix(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_reads_numbers_and_strings() {
        assert_eq!(Amount::from_raw(json!(200)).lenient(), 200.0);
        assert_eq!(Amount::from_raw(json!("120.50")).lenient(), 120.5);
        assert_eq!(Amount::from_raw(json!("  42")).lenient(), 42.0);
    }

    #[test]
    fn test_lenient_reads_leading_literal() {
        assert_eq!(Amount::from("12.5 EUR").lenient(), 12.5);
        assert_eq!(Amount::from("1e3x").lenient(), 1000.0);
        assert_eq!(Amount::from("7e").lenient(), 7.0);
        assert_eq!(Amount::from(".5").lenient(), 0.5);
        assert_eq!(Amount::from("-3").lenient(), -3.0);
    }

    #[test]
    fn test_lenient_falls_back_to_zero() {
        assert_eq!(Amount::from("abc").lenient(), 0.0);
        assert_eq!(Amount::from("").lenient(), 0.0);
        assert_eq!(Amount::from(".").lenient(), 0.0);
        assert_eq!(Amount::from_raw(json!(true)).lenient(), 0.0);
        assert_eq!(Amount::default().lenient(), 0.0);
    }

    #[test]
    fn test_strict_rejects_partial_input() {
        assert_eq!(Amount::from("12.5").strict(), Some(12.5));
        assert_eq!(Amount::from("12.5 EUR").strict(), None);
        assert_eq!(Amount::from("NaN").strict(), None);
        assert_eq!(Amount::default().strict(), None);
    }

    #[test]
    fn test_raw_value_survives_serialization() {
        let amount = Amount::from("99.90");
        assert_eq!(serde_json::to_value(&amount).unwrap(), json!("99.90"));

        let parsed: Amount = serde_json::from_value(json!(15)).unwrap();
        assert_eq!(parsed.raw(), &json!(15));
    }
}
