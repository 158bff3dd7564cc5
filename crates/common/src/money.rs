//! Comma-decimal monetary text handling.
//!
//! Amounts are entered and displayed as `"NN,NN"` (comma separator, two
//! decimal places) while being stored as plain numeric values.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid amount: {0:?}")]
pub struct InvalidAmount(pub String);

/// Parse a comma-decimal amount such as `"10,50"` into a numeric value.
///
/// A dot separator is tolerated as well; anything that does not parse as a
/// finite number is rejected.
pub fn parse_amount(text: &str) -> Result<f64, InvalidAmount> {
    let normalized = text.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(InvalidAmount(text.to_string()));
    }
    let value: f64 = normalized
        .parse()
        .map_err(|_| InvalidAmount(text.to_string()))?;
    if !value.is_finite() {
        return Err(InvalidAmount(text.to_string()));
    }
    Ok(value)
}

/// Format a numeric amount back to comma-decimal text with two places.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value).replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_decimal() {
        assert_eq!(parse_amount("10,50").unwrap(), 10.50);
        assert_eq!(parse_amount("0,00").unwrap(), 0.0);
        assert_eq!(parse_amount(" 7,5 ").unwrap(), 7.5);
    }

    #[test]
    fn tolerates_dot_separator() {
        assert_eq!(parse_amount("10.50").unwrap(), 10.50);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("10,5,0").is_err());
        assert!(parse_amount("NaN").is_err());
    }

    #[test]
    fn formats_two_places_with_comma() {
        assert_eq!(format_amount(10.5), "10,50");
        assert_eq!(format_amount(0.0), "0,00");
        assert_eq!(format_amount(1234.567), "1234,57");
    }

    #[test]
    fn value_text_round_trips() {
        let v = parse_amount("10,50").unwrap();
        assert_eq!(format_amount(v), "10,50");
    }
}
