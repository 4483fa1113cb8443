//! Payment amounts
//!
//! Amounts come from the spreadsheet as Brazilian-formatted text
//! (`"R$ 1.234,56"`), as plain decimals (`"150.5"`) when the cell holds a
//! number, or as bare integers. They are held as integer centavos and
//! rendered with two decimals for the payment API.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

const CURRENCY_SYMBOL: &str = "R$";

/// `1.234` / `12.345.678`: dots used only as thousands separators
static THOUSANDS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(\.\d{3})+$").expect("thousands pattern is a valid regex"));

/// Positive amount in centavos
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount {
    cents: u64,
}

impl Amount {
    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// Parse a spreadsheet amount
///
/// A comma marks Brazilian formatting: dots are thousands separators and the
/// comma is the decimal separator. Without a comma a dot is a decimal point,
/// unless every group after it has exactly three digits. Fractions beyond
/// centavos are rounded half up.
pub fn parse_amount(raw: &str) -> Result<Amount> {
    let cleaned: String = raw
        .replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(Error::InvalidInput(format!("empty amount: '{}'", raw)));
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if THOUSANDS_ONLY.is_match(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    let cents = to_cents(&normalized)
        .ok_or_else(|| Error::InvalidInput(format!("invalid amount: '{}'", raw)))?;

    if cents == 0 {
        return Err(Error::InvalidInput(format!(
            "amount must be a positive number: '{}'",
            raw
        )));
    }

    Ok(Amount::from_cents(cents))
}

/// Convert `123.456` style decimal text to centavos, rounding half up
fn to_cents(decimal: &str) -> Option<u64> {
    let (whole, fraction) = decimal.split_once('.').unwrap_or((decimal, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let digit = |i: usize| fraction.as_bytes().get(i).map_or(0, |b| u64::from(b - b'0'));
    let round_up = u64::from(digit(2) >= 5);

    whole
        .checked_mul(100)?
        .checked_add(digit(0) * 10 + digit(1))?
        .checked_add(round_up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_format() {
        assert_eq!(parse_amount("R$ 1.234,56").unwrap().to_string(), "1234.56");
        assert_eq!(parse_amount("R$1.234.567,8").unwrap().to_string(), "1234567.80");
        assert_eq!(parse_amount("150,00").unwrap().to_string(), "150.00");
    }

    #[test]
    fn test_plain_decimal_from_number_cell() {
        assert_eq!(parse_amount("150.5").unwrap().to_string(), "150.50");
        assert_eq!(parse_amount("0.01").unwrap().cents(), 1);
    }

    #[test]
    fn test_integer() {
        assert_eq!(parse_amount("300").unwrap().to_string(), "300.00");
    }

    #[test]
    fn test_thousands_without_decimals() {
        assert_eq!(parse_amount("R$ 2.500").unwrap().to_string(), "2500.00");
        assert_eq!(parse_amount("1.000.000").unwrap().cents(), 100_000_000);
    }

    #[test]
    fn test_rounds_to_centavos() {
        assert_eq!(parse_amount("10,005").unwrap().cents(), 1001);
        assert_eq!(parse_amount("10,004").unwrap().cents(), 1000);
    }

    #[test]
    fn test_nbsp_and_spaces_removed() {
        assert_eq!(parse_amount("R$\u{a0}1.234,56").unwrap().cents(), 123_456);
        assert_eq!(parse_amount("  75,90 ").unwrap().cents(), 7590);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("R$").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("1,2,3").is_err());
    }

    #[test]
    fn test_leading_decimal_point() {
        assert_eq!(parse_amount(".5").unwrap().cents(), 50);
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(parse_amount("999999999999999999999").is_err());
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-10,00").is_err());
        assert!(parse_amount("0,001").is_err());
    }
}
