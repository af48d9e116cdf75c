pub mod export;
pub mod generate;
pub mod health;
pub mod upload;

use crate::error::FlashGenError;
use serde_json::Value;

/// Read a requested item count sent as a JSON number or a string.
///
/// Anything missing, non-numeric or below 1 falls back to `default`. A count
/// above `max` is rejected.
pub fn parse_count(
    value: Option<&Value>,
    default: usize,
    max: usize,
    field: &str,
) -> Result<usize, FlashGenError> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_count_str(s),
        _ => None,
    };
    bounded_count(parsed, default, max, field)
}

/// Same as [`parse_count`] for a multipart text field.
pub fn parse_count_field(
    value: Option<&str>,
    default: usize,
    max: usize,
    field: &str,
) -> Result<usize, FlashGenError> {
    bounded_count(value.and_then(parse_count_str), default, max, field)
}

fn parse_count_str(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn bounded_count(
    parsed: Option<f64>,
    default: usize,
    max: usize,
    field: &str,
) -> Result<usize, FlashGenError> {
    match parsed {
        Some(n) if n.is_finite() && n >= 1.0 => {
            let n = n.floor();
            // Compared as a float so huge values never reach the cast.
            if n > max as f64 {
                return Err(FlashGenError::InvalidRequest(format!(
                    "{field} must be at most {max}"
                )));
            }
            Ok(n as usize)
        }
        Some(n) if n == f64::INFINITY => Err(FlashGenError::InvalidRequest(format!(
            "{field} must be at most {max}"
        ))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn count(value: Value, default: usize) -> usize {
        parse_count(Some(&value), default, 100, "flashcardCount").unwrap()
    }

    #[test]
    fn counts_from_numbers_and_strings() {
        assert_eq!(count(json!(12), 20), 12);
        assert_eq!(count(json!("7"), 20), 7);
        assert_eq!(count(json!(" 9 "), 20), 9);
        assert_eq!(count(json!(4.8), 20), 4);
        assert_eq!(count(json!(100), 20), 100);
        assert_eq!(count(json!("100.9"), 20), 100);
    }

    #[test]
    fn invalid_counts_fall_back() {
        assert_eq!(parse_count(None, 20, 100, "flashcardCount").unwrap(), 20);
        assert_eq!(count(json!(0), 20), 20);
        assert_eq!(count(json!(-3), 15), 15);
        assert_eq!(count(json!("abc"), 15), 15);
        assert_eq!(count(json!("-inf"), 15), 15);
        assert_eq!(count(json!("NaN"), 15), 15);
        assert_eq!(count(json!(null), 15), 15);
        assert_eq!(count(json!([3]), 15), 15);
    }

    #[test]
    fn counts_above_max_are_rejected() {
        for value in [json!(101), json!("1e30"), json!("100000000"), json!("inf"), json!(1e300)] {
            let err = parse_count(Some(&value), 20, 100, "flashcardCount").unwrap_err();
            assert!(
                matches!(&err, FlashGenError::InvalidRequest(m) if m.contains("flashcardCount")),
                "{value}: {err:?}"
            );
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn multipart_counts() {
        assert_eq!(parse_count_field(Some("30"), 20, 100, "flashcardCount").unwrap(), 30);
        assert_eq!(parse_count_field(Some(""), 20, 100, "flashcardCount").unwrap(), 20);
        assert_eq!(parse_count_field(None, 15, 100, "qcmCount").unwrap(), 15);
        assert!(parse_count_field(Some("1e30"), 15, 100, "qcmCount").is_err());
    }
}
