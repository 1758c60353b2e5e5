//! Numeric cell normalization.
//!
//! Report tables mix currency prefixes, thousands separators, unit words and
//! accounting-style negatives. [`NumericNormalizer`] reduces a cell to a plain
//! number or tells why it could not.

use std::str::FromStr;

use crate::error::NumericError;

use super::patterns::{CURRENCY_TOKEN, NON_NUMERIC};

/// Default magnitude above which a parse is treated as concatenated numbers.
pub const DEFAULT_MAX_MAGNITUDE: f64 = 1e12;

/// Parses single table cells into numbers.
#[derive(Debug, Clone, Copy)]
pub struct NumericNormalizer {
    max_magnitude: f64,
}

impl NumericNormalizer {
    pub fn new() -> Self {
        Self {
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
        }
    }

    /// Set the largest accepted absolute value.
    pub fn with_max_magnitude(mut self, max_magnitude: f64) -> Self {
        self.max_magnitude = max_magnitude;
        self
    }

    /// Parse a cell, reporting why it holds no value.
    pub fn parse(&self, text: &str) -> Result<f64, NumericError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(NumericError::Empty);
        }

        let signed = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            Some(inner) => format!("-{}", inner),
            None => trimmed.to_string(),
        };

        let without_currency = CURRENCY_TOKEN.replace_all(&signed, "");
        let multiplier = unit_multiplier(&without_currency);
        let residual = NON_NUMERIC.replace_all(&without_currency, "");

        if matches!(residual.as_ref(), "" | "." | "-") {
            return Err(NumericError::NoDigits);
        }

        let value = f64::from_str(&residual)
            .map_err(|_| NumericError::Malformed(residual.to_string()))?
            * multiplier;

        if !value.is_finite() || value.abs() > self.max_magnitude {
            return Err(NumericError::OutOfBounds(value));
        }

        Ok(value)
    }

    /// Parse a cell, discarding the reason for failure.
    pub fn clean(&self, text: &str) -> Option<f64> {
        self.parse(text).ok()
    }
}

impl Default for NumericNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Multiplier implied by a unit word in the text.
pub fn unit_multiplier(text: &str) -> f64 {
    let lower = text.to_lowercase();
    if lower.contains("billion") {
        1e9
    } else if lower.contains("million") {
        1e6
    } else if lower.contains("thousand") {
        1e3
    } else {
        1.0
    }
}

/// Parse a cell with default bounds.
pub fn parse_numeric(text: &str) -> Result<f64, NumericError> {
    NumericNormalizer::new().parse(text)
}

/// Parse a cell with default bounds, `None` when it holds no value.
pub fn clean_numeric(text: &str) -> Option<f64> {
    NumericNormalizer::new().clean(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthesized_negative() {
        assert_eq!(parse_numeric("(1,234.5)"), Ok(-1234.5));
        assert_eq!(parse_numeric(" (Rs. 500) "), Ok(-500.0));
    }

    #[test]
    fn test_currency_and_separators() {
        assert_eq!(clean_numeric("Rs. 125,430 Mn"), Some(125430.0));
        assert_eq!(clean_numeric("LKR 1,000.25"), Some(1000.25));
        assert_eq!(clean_numeric("USD 42"), Some(42.0));
        assert_eq!(clean_numeric("$7.5"), Some(7.5));
    }

    #[test]
    fn test_unit_words() {
        assert_eq!(clean_numeric("1.5 billion"), Some(1.5e9));
        assert_eq!(clean_numeric("2 Million"), Some(2e6));
        assert_eq!(clean_numeric("3 thousand"), Some(3e3));
    }

    #[test]
    fn test_no_value() {
        assert_eq!(parse_numeric("abc"), Err(NumericError::NoDigits));
        assert_eq!(parse_numeric("   "), Err(NumericError::Empty));
        assert_eq!(parse_numeric("-"), Err(NumericError::NoDigits));
        assert_eq!(parse_numeric("."), Err(NumericError::NoDigits));
        assert_eq!(parse_numeric("n/a -"), Err(NumericError::NoDigits));
    }

    #[test]
    fn test_malformed_is_distinguished_from_missing() {
        assert!(matches!(parse_numeric("1.2.3"), Err(NumericError::Malformed(_))));
        assert!(matches!(parse_numeric("2020-21"), Err(NumericError::Malformed(_))));
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(matches!(
            parse_numeric("12345678901234"),
            Err(NumericError::OutOfBounds(_))
        ));
        assert!(matches!(
            parse_numeric("5000 billion"),
            Err(NumericError::OutOfBounds(_))
        ));
        let strict = NumericNormalizer::new().with_max_magnitude(100.0);
        assert_eq!(strict.clean("101"), None);
        assert_eq!(strict.clean("100"), Some(100.0));
    }

    #[test]
    fn test_idempotent_on_own_output() {
        for input in ["(1,234.5)", "Rs. 125,430 Mn", "0.0042", "1.5 billion", "-17"] {
            let value = parse_numeric(input).unwrap();
            assert_eq!(parse_numeric(&value.to_string()), Ok(value));
        }
    }
}
