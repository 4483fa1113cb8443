//! pixpay library - scheduled PIX payments from a spreadsheet
//!
//! Reads the payment sheet, picks the rows due on a given date, classifies
//! each beneficiary's PIX key and submits the payment to the bank, writing
//! the bank's request code back to the sheet so the row is never paid twice.

pub mod bank;
pub mod record;
pub mod runner;
pub mod sheet;

pub use bank::{BankError, InterClient, PaymentGateway, PixPayment};
pub use record::PaymentRecord;
pub use runner::{PaymentRunner, RowOutcome, RunError, RunOptions, RunSummary};
pub use sheet::{GoogleSheet, MemorySheet, PaymentSheet, SheetError};
