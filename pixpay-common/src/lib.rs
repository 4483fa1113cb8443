//! # PixPay Common Library
//!
//! Shared code for the PixPay scheduled-payment tools:
//! - PIX key classification and CPF/CNPJ check digits
//! - Spreadsheet amount parsing
//! - Payment-date helpers
//! - Configuration loading
//! - Common error types

pub mod amount;
pub mod config;
pub mod error;
pub mod key;
pub mod time;

pub use error::{Error, Result};
pub use key::{classify, ClassifiedKey, PixKeyType};
