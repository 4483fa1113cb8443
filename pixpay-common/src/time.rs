//! Payment date utilities
//!
//! The spreadsheet stores due dates as `dd/mm/yyyy` in the local calendar.

use chrono::{DateTime, Local, NaiveDate};

/// Date format used by the `data_competencia` column
pub const SHEET_DATE_FORMAT: &str = "%d/%m/%Y";

/// Get current local timestamp
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Today's date in the local calendar
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Format a date the way the spreadsheet writes it (`16/10/2026`)
pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(SHEET_DATE_FORMAT).to_string()
}

/// Parse a spreadsheet date, tolerating surrounding whitespace
pub fn parse_sheet_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), SHEET_DATE_FORMAT).ok()
}
