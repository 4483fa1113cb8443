//! Payment spreadsheet rows

use chrono::NaiveDate;
use pixpay_common::time::parse_sheet_date;

/// Column headers of the payment sheet
pub const COLUMN_BENEFICIARY: &str = "nome_beneficiario";
pub const COLUMN_PIX_KEY: &str = "chave_pix";
pub const COLUMN_AMOUNT: &str = "valor";
pub const COLUMN_DESCRIPTION: &str = "descricao";
pub const COLUMN_DUE_DATE: &str = "data_competencia";
pub const COLUMN_REQUEST_CODE: &str = "codigo_solicitacao";

/// One data row of the payment sheet
///
/// Cells are kept as the sheet displays them; parsing happens when the row
/// is processed so a malformed cell only fails its own payment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentRecord {
    pub beneficiary: String,
    pub pix_key: String,
    pub amount: String,
    pub description: String,
    /// `dd/mm/yyyy`
    pub due_date: String,
    /// Bank request code, filled once the payment has been submitted
    pub request_code: String,
}

impl PaymentRecord {
    /// Build a record from a header row and one data row
    ///
    /// Matching is by header name (case and surrounding whitespace ignored).
    /// Unknown columns are ignored and cells missing at the end of a short
    /// row read as empty.
    pub fn from_row(headers: &[String], cells: &[String]) -> Self {
        let mut record = Self::default();

        for (index, header) in headers.iter().enumerate() {
            let value = cells.get(index).map(|c| c.trim().to_string()).unwrap_or_default();
            match header.trim().to_lowercase().as_str() {
                COLUMN_BENEFICIARY => record.beneficiary = value,
                COLUMN_PIX_KEY => record.pix_key = value,
                COLUMN_AMOUNT => record.amount = value,
                COLUMN_DESCRIPTION => record.description = value,
                COLUMN_DUE_DATE => record.due_date = value,
                COLUMN_REQUEST_CODE => record.request_code = value,
                _ => {}
            }
        }

        record
    }

    /// A request code means the bank already accepted this payment
    pub fn is_already_paid(&self) -> bool {
        !self.request_code.trim().is_empty()
    }

    /// Whether the due date cell holds `date`; unparsable dates are never due
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        parse_sheet_date(&self.due_date) == Some(date)
    }
}
