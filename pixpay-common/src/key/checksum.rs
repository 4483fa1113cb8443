//! CPF and CNPJ check digits
//!
//! Both registries end in two modulo-11 check digits. The first is computed
//! over every digit before it, the second over every digit before it
//! (including the first check digit). A remainder below 2 yields 0,
//! anything else yields `11 - remainder`.
//!
//! Strings made of one repeated digit pass the arithmetic but are never
//! issued, so they are rejected up front.

/// Number of digits in a CPF
pub(crate) const CPF_LEN: usize = 11;

/// Number of digits in a CNPJ
pub(crate) const CNPJ_LEN: usize = 14;

const CPF_WEIGHTS_FIRST: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_WEIGHTS_SECOND: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

const CNPJ_WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validate a digits-only CPF (individual taxpayer number)
///
/// Returns `false` for anything that is not exactly 11 ASCII digits.
pub fn is_valid_cpf(cpf: &str) -> bool {
    match parse_digits(cpf, CPF_LEN) {
        Some(digits) => verify(&digits, &CPF_WEIGHTS_FIRST, &CPF_WEIGHTS_SECOND),
        None => false,
    }
}

/// Validate a digits-only CNPJ (company taxpayer number)
///
/// Returns `false` for anything that is not exactly 14 ASCII digits.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    match parse_digits(cnpj, CNPJ_LEN) {
        Some(digits) => verify(&digits, &CNPJ_WEIGHTS_FIRST, &CNPJ_WEIGHTS_SECOND),
        None => false,
    }
}

/// Compute one modulo-11 check digit
///
/// `digits` and `weights` are zipped, so the shorter of the two bounds the sum.
fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

fn parse_digits(value: &str, expected_len: usize) -> Option<Vec<u32>> {
    if value.len() != expected_len {
        return None;
    }
    value.chars().map(|c| c.to_digit(10)).collect()
}

fn verify(digits: &[u32], first_weights: &[u32], second_weights: &[u32]) -> bool {
    if digits.windows(2).all(|pair| pair[0] == pair[1]) {
        return false;
    }

    let len = digits.len();
    check_digit(&digits[..len - 2], first_weights) == digits[len - 2]
        && check_digit(&digits[..len - 1], second_weights) == digits[len - 1]
}
