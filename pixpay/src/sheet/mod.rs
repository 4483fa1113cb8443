//! Payment spreadsheet access
//!
//! The sheet is a row-oriented data source: a header row followed by one
//! row per scheduled payment. The runner only ever reads every record and
//! writes single cells back.

mod google;
mod memory;

pub use google::GoogleSheet;
pub use memory::MemorySheet;

use crate::record::PaymentRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Spreadsheet access errors
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Spreadsheet access denied (HTTP {0})")]
    Unauthorized(u16),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Cell out of range: row {row}, column {column}")]
    OutOfRange { row: u32, column: u32 },
}

/// Row-oriented payment sheet
#[async_trait]
pub trait PaymentSheet: Send + Sync {
    /// All data rows in sheet order, header excluded
    async fn records(&self) -> Result<Vec<PaymentRecord>, SheetError>;

    /// Overwrite one cell; `row` and `column` are 1-based sheet coordinates
    async fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<(), SheetError>;
}

/// Sheet row of the record at `index` in [`PaymentSheet::records`]
///
/// Sheet rows are 1-based and row 1 is the header.
pub fn sheet_row(index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(2))
}

/// A1-notation column letters (`1` → `A`, `27` → `AA`)
pub fn column_letters(column: u32) -> String {
    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
