//! PIX key classification
//!
//! A PIX key arrives from the spreadsheet as free text: an e-mail address,
//! a CPF or CNPJ with or without punctuation, a phone number with or without
//! the Brazilian country code, or a random (UUID) key. [`classify`] decides
//! which one it is and produces the normalized value the payment API expects.
//!
//! # Decision Cascade
//! The first matching rule wins:
//! 1. Blank input → `UNKNOWN`
//! 2. E-mail pattern → `EMAIL` (lower-cased)
//! 3. Keep only digits and a leading `+`, strip a `+55` / `55` country code
//! 4. 14 digits → `CNPJ`
//! 5. 11 digits → `CPF`, or `PHONE` when the number carried a country code
//!    or fails the CPF checksum while looking like a mobile number
//! 6. 10 digits, or any number that carried a country code → `PHONE`
//! 7. Long, hyphenated or digit-free input → `RANDOM` (verbatim)
//! 8. Otherwise guess by digit count, always flagged invalid
//!
//! Classification never fails. A key that could not be confidently
//! classified still comes back with `is_valid == false` so the caller can
//! attempt the payment and let the bank have the final word.

mod checksum;

pub use checksum::{is_valid_cnpj, is_valid_cpf};

use checksum::{CNPJ_LEN, CPF_LEN};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// National phone number lengths (area code + subscriber number)
const LANDLINE_LEN: usize = 10;
const MOBILE_LEN: usize = 11;

/// Keys at least this long (in characters) with no better match are random keys
const RANDOM_KEY_MIN_LEN: usize = 32;

const COUNTRY_CODE: &str = "55";
const INTERNATIONAL_PREFIX: &str = "+55";

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("e-mail pattern is a valid regex")
});

/// PIX key kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixKeyType {
    Email,
    Cpf,
    Cnpj,
    Phone,
    Random,
    Unknown,
}

impl PixKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixKeyType::Email => "EMAIL",
            PixKeyType::Cpf => "CPF",
            PixKeyType::Cnpj => "CNPJ",
            PixKeyType::Phone => "PHONE",
            PixKeyType::Random => "RANDOM",
            PixKeyType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one raw key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedKey {
    #[serde(rename = "type")]
    pub key_type: PixKeyType,
    /// Digits for CPF/CNPJ/PHONE (phone without country code), lower-case
    /// for EMAIL, verbatim for RANDOM
    pub normalized_value: String,
    /// Whether checksum or format validation passed
    pub is_valid: bool,
}

impl ClassifiedKey {
    fn new(key_type: PixKeyType, normalized_value: impl Into<String>, is_valid: bool) -> Self {
        Self {
            key_type,
            normalized_value: normalized_value.into(),
            is_valid,
        }
    }

    fn unknown() -> Self {
        Self::new(PixKeyType::Unknown, String::new(), false)
    }

    /// Key as it must be sent in the payment request
    ///
    /// Phones gain the `+55` prefix, e-mails are lower-cased, everything else
    /// goes out as normalized. `UNKNOWN` yields an empty string.
    pub fn payment_key(&self) -> String {
        match self.key_type {
            PixKeyType::Email => self.normalized_value.to_lowercase(),
            PixKeyType::Phone if self.normalized_value.starts_with(INTERNATIONAL_PREFIX) => {
                self.normalized_value.clone()
            }
            PixKeyType::Phone => format!("{}{}", INTERNATIONAL_PREFIX, self.normalized_value),
            PixKeyType::Cpf | PixKeyType::Cnpj | PixKeyType::Random => {
                self.normalized_value.clone()
            }
            PixKeyType::Unknown => String::new(),
        }
    }
}

/// Check whether `value` is a well-formed e-mail address
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Classify a raw PIX key
///
/// Total over all inputs: never panics and never returns an error.
pub fn classify(raw: &str) -> ClassifiedKey {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        debug!("Empty PIX key");
        return ClassifiedKey::unknown();
    }

    if trimmed.contains('@') && is_valid_email(trimmed) {
        debug!(key = %trimmed, "PIX key classified as EMAIL");
        return ClassifiedKey::new(PixKeyType::Email, trimmed.to_lowercase(), true);
    }

    let extracted = extract_digits(trimmed);
    let (digits, international) = strip_country_code(&extracted);

    debug!(
        raw = %raw,
        digits = %digits,
        len = digits.len(),
        international,
        "Analyzing PIX key"
    );

    let classified = classify_digits(trimmed, digits, international);

    if classified.is_valid {
        debug!(
            key_type = %classified.key_type,
            value = %classified.normalized_value,
            "PIX key classified"
        );
    } else {
        warn!(
            raw = %raw,
            key_type = %classified.key_type,
            value = %classified.normalized_value,
            "PIX key failed validation, keeping best-effort classification"
        );
    }

    classified
}

/// Keep digits and a leading `+`, dropping punctuation, spaces and letters
fn extract_digits(value: &str) -> String {
    let (plus, rest) = match value.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", value),
    };
    plus.chars()
        .chain(rest.chars().filter(|c| c.is_ascii_digit()))
        .collect()
}

/// Strip a Brazilian country code, reporting whether one was present
///
/// A bare `55` only counts as a country code when what follows is a
/// 10 or 11 digit national number; otherwise it is part of a CPF/CNPJ.
/// A leading `+` before any other code is dropped, so the result is digits only.
fn strip_country_code(extracted: &str) -> (&str, bool) {
    if let Some(national) = extracted.strip_prefix(INTERNATIONAL_PREFIX) {
        return (national, true);
    }
    let extracted = extracted.strip_prefix('+').unwrap_or(extracted);

    let with_code = COUNTRY_CODE.len() + LANDLINE_LEN..=COUNTRY_CODE.len() + MOBILE_LEN;
    if extracted.starts_with(COUNTRY_CODE) && with_code.contains(&extracted.len()) {
        return (&extracted[COUNTRY_CODE.len()..], true);
    }

    (extracted, false)
}

fn classify_digits(trimmed: &str, digits: &str, international: bool) -> ClassifiedKey {
    match digits.len() {
        CNPJ_LEN => ClassifiedKey::new(PixKeyType::Cnpj, digits, is_valid_cnpj(digits)),
        CPF_LEN if international => phone(digits),
        CPF_LEN => {
            if is_valid_cpf(digits) {
                ClassifiedKey::new(PixKeyType::Cpf, digits, true)
            } else if is_valid_phone(digits) {
                debug!(digits = %digits, "CPF checksum failed, key has mobile number shape");
                phone(digits)
            } else {
                ClassifiedKey::new(PixKeyType::Cpf, digits, false)
            }
        }
        LANDLINE_LEN => phone(digits),
        _ if international => phone(digits),
        _ if is_random_key(trimmed, digits) => {
            ClassifiedKey::new(PixKeyType::Random, trimmed, true)
        }
        len => infer_by_length(trimmed, digits, len),
    }
}

fn phone(digits: &str) -> ClassifiedKey {
    ClassifiedKey::new(PixKeyType::Phone, digits, is_valid_phone(digits))
}

/// Area code 11-99; mobiles additionally start with 9 after the area code
fn is_valid_phone(digits: &str) -> bool {
    let area_code_ok = digits
        .get(..2)
        .filter(|ddd| ddd.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|ddd| ddd.parse::<u8>().ok())
        .is_some_and(|ddd| (11..=99).contains(&ddd));

    match digits.len() {
        MOBILE_LEN => area_code_ok && digits.as_bytes()[2] == b'9',
        LANDLINE_LEN => area_code_ok,
        _ => false,
    }
}

fn is_random_key(trimmed: &str, digits: &str) -> bool {
    trimmed.chars().count() >= RANDOM_KEY_MIN_LEN || trimmed.contains('-') || digits.is_empty()
}

/// Last resort when no rule matched; the result is never valid
fn infer_by_length(trimmed: &str, digits: &str, len: usize) -> ClassifiedKey {
    debug!(len, "PIX key type not identified, inferring from digit count");
    if len > CNPJ_LEN {
        ClassifiedKey::new(PixKeyType::Random, trimmed, false)
    } else if len > CPF_LEN {
        ClassifiedKey::new(PixKeyType::Cnpj, digits, false)
    } else {
        // 11 digits never reaches this point, so below CNPJ range is a phone guess
        ClassifiedKey::new(PixKeyType::Phone, digits, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(key: &ClassifiedKey) -> (PixKeyType, &str, bool) {
        (key.key_type, key.normalized_value.as_str(), key.is_valid)
    }

    #[test]
    fn test_blank_is_unknown() {
        assert_eq!(triple(&classify("")), (PixKeyType::Unknown, "", false));
        assert_eq!(triple(&classify("   \t\n")), (PixKeyType::Unknown, "", false));
    }

    #[test]
    fn test_email_lowercased_and_trimmed() {
        let key = classify("  Maria.Silva+pix@Example.COM.br ");
        assert_eq!(
            triple(&key),
            (PixKeyType::Email, "maria.silva+pix@example.com.br", true)
        );
    }

    #[test]
    fn test_malformed_email_falls_through() {
        // No TLD: not an e-mail, no digits, so it ends up as a random key
        let key = classify("user@localhost");
        assert_eq!(key.key_type, PixKeyType::Random);
        assert_eq!(key.normalized_value, "user@localhost");
    }

    #[test]
    fn test_extract_digits_keeps_leading_plus_only() {
        assert_eq!(extract_digits("+55 (11) 98765-4321"), "+5511987654321");
        assert_eq!(extract_digits("11987654321+"), "11987654321");
        assert_eq!(extract_digits("11+98765+4321"), "11987654321");
        assert_eq!(extract_digits("chave+pix"), "");
        assert_eq!(extract_digits("abc"), "");
    }

    #[test]
    fn test_strip_country_code() {
        assert_eq!(strip_country_code("+5511987654321"), ("11987654321", true));
        assert_eq!(strip_country_code("5511987654321"), ("11987654321", true));
        assert_eq!(strip_country_code("551133334444"), ("1133334444", true));
        // 11 digits starting with 55 is a CPF candidate, not a phone
        assert_eq!(strip_country_code("55123456789"), ("55123456789", false));
        // 14 digits starting with 55 is a CNPJ candidate
        assert_eq!(strip_country_code("55222333000181"), ("55222333000181", false));
        // Other country codes lose the plus and are not international
        assert_eq!(strip_country_code("+11987654321"), ("11987654321", false));
        assert_eq!(strip_country_code("+"), ("", false));
    }

    #[test]
    fn test_stray_plus_signs_are_ignored() {
        assert_eq!(
            triple(&classify("11987654321+")),
            (PixKeyType::Phone, "11987654321", true)
        );
        assert_eq!(
            triple(&classify("123.456+789-09")),
            (PixKeyType::Cpf, "12345678909", true)
        );
        assert_eq!(
            triple(&classify("chave+pix")),
            (PixKeyType::Random, "chave+pix", true)
        );
    }

    #[test]
    fn test_plus_before_other_country_code() {
        assert_eq!(
            triple(&classify("+11987654321")),
            (PixKeyType::Phone, "11987654321", true)
        );
        assert_eq!(
            triple(&classify("+1234567890")),
            (PixKeyType::Phone, "1234567890", true)
        );
        assert_eq!(
            triple(&classify("+1 234 567")),
            (PixKeyType::Phone, "1234567", false)
        );
    }

    #[test]
    fn test_cnpj_dispatch() {
        let key = classify("11.222.333/0001-81");
        assert_eq!(triple(&key), (PixKeyType::Cnpj, "11222333000181", true));
    }

    #[test]
    fn test_cpf_dispatch() {
        let key = classify("123.456.789-09");
        assert_eq!(triple(&key), (PixKeyType::Cpf, "12345678909", true));
    }

    #[test]
    fn test_invalid_cpf_without_mobile_shape_stays_cpf() {
        let key = classify("123.456.789-00");
        assert_eq!(triple(&key), (PixKeyType::Cpf, "12345678900", false));
    }

    #[test]
    fn test_bare_mobile_number_is_phone() {
        let key = classify("(21) 99876-5432");
        assert_eq!(triple(&key), (PixKeyType::Phone, "21998765432", true));
    }

    #[test]
    fn test_landline_is_phone() {
        let key = classify("(11) 3333-4444");
        assert_eq!(triple(&key), (PixKeyType::Phone, "1133334444", true));
    }

    #[test]
    fn test_landline_with_bad_area_code() {
        let key = classify("0533334444");
        assert_eq!(triple(&key), (PixKeyType::Phone, "0533334444", false));
    }

    #[test]
    fn test_international_short_number_is_invalid_phone() {
        let key = classify("+55 1234");
        assert_eq!(triple(&key), (PixKeyType::Phone, "1234", false));
    }

    #[test]
    fn test_international_mobile_without_nine_is_invalid() {
        let key = classify("+55 11 8765-43210");
        assert_eq!(triple(&key), (PixKeyType::Phone, "11876543210", false));
    }

    #[test]
    fn test_uuid_is_random() {
        let uuid = "a1b2c3d4-e5f6-47a8-9b0c-1d2e3f4a5b6c";
        assert_eq!(triple(&classify(uuid)), (PixKeyType::Random, uuid, true));
    }

    #[test]
    fn test_long_key_without_hyphen_is_random() {
        let key = "a1b2c3d4e5f647a89b0c1d2e3f4a5b6c";
        assert_eq!(triple(&classify(key)), (PixKeyType::Random, key, true));
    }

    #[test]
    fn test_letters_only_is_random() {
        assert_eq!(
            triple(&classify("chave")),
            (PixKeyType::Random, "chave", true)
        );
    }

    #[test]
    fn test_fallback_by_digit_count() {
        assert_eq!(
            triple(&classify("123456789012")),
            (PixKeyType::Cnpj, "123456789012", false)
        );
        assert_eq!(
            triple(&classify("1234567890123")),
            (PixKeyType::Cnpj, "1234567890123", false)
        );
        assert_eq!(
            triple(&classify("123456789012345")),
            (PixKeyType::Random, "123456789012345", false)
        );
        assert_eq!(
            triple(&classify("12345")),
            (PixKeyType::Phone, "12345", false)
        );
    }

    #[test]
    fn test_payment_key_formatting() {
        assert_eq!(classify("11987654321").payment_key(), "+5511987654321");
        assert_eq!(classify("+55 11 98765-4321").payment_key(), "+5511987654321");
        assert_eq!(classify("User@Example.com").payment_key(), "user@example.com");
        assert_eq!(classify("123.456.789-09").payment_key(), "12345678909");
        assert_eq!(classify("").payment_key(), "");
    }

    #[test]
    fn test_payment_key_keeps_existing_prefix() {
        let key = ClassifiedKey::new(PixKeyType::Phone, "+5511987654321", true);
        assert_eq!(key.payment_key(), "+5511987654321");
    }

    #[test]
    fn test_key_type_serializes_uppercase() {
        let json = serde_json::to_string(&classify("12345678909")).unwrap();
        assert_eq!(
            json,
            r#"{"type":"CPF","normalized_value":"12345678909","is_valid":true}"#
        );
        assert_eq!(PixKeyType::Random.to_string(), "RANDOM");
    }
}
