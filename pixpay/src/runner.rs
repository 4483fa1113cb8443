//! Payment run orchestration
//!
//! One run pays every row due on a given date:
//! 1. Load the sheet and keep rows whose due date matches
//! 2. Obtain one bank token (only when something is due)
//! 3. For each due row, in sheet order:
//!    - skip rows that already carry a request code
//!    - skip rows without a PIX key
//!    - classify the key and submit the payment
//!    - write the bank's request code back to the row
//!
//! A failing row is logged and counted; it never stops the rows after it.
//! A key that fails validation is only a warning: the bank's answer is
//! authoritative.

use crate::bank::{AccessToken, BankError, PaymentGateway, PixPayment};
use crate::record::PaymentRecord;
use crate::sheet::{sheet_row, PaymentSheet, SheetError};
use chrono::NaiveDate;
use pixpay_common::amount::parse_amount;
use pixpay_common::key::{classify, ClassifiedKey, PixKeyType};
use pixpay_common::time::format_sheet_date;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that abort the whole run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Payment sheet unavailable: {0}")]
    Sheet(#[from] SheetError),

    #[error("Bank authentication failed: {0}")]
    Bank(#[from] BankError),
}

/// Run parameters
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Rows whose `data_competencia` equals this date are paid
    pub date: NaiveDate,
    /// Classify and log payloads without contacting the bank
    pub dry_run: bool,
    /// 1-based column receiving the request code
    pub request_code_column: u32,
}

/// What happened to one due row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Bank accepted the payment
    Paid { request_code: Option<String> },
    /// Dry run: payment would have been submitted
    Planned,
    /// Row already had a request code
    AlreadyPaid,
    /// Row had no PIX key
    MissingKey,
    /// Row could not be paid
    Failed { reason: String },
}

/// Per-row report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    /// Position in the sheet's records (sheet row is `index + 2`)
    pub index: usize,
    pub beneficiary: String,
    pub key: Option<ClassifiedKey>,
    pub outcome: RowOutcome,
}

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub due: usize,
    pub paid: usize,
    pub planned: usize,
    pub already_paid: usize,
    pub missing_key: usize,
    pub failed: usize,
    pub rows: Vec<RowReport>,
}

impl RunSummary {
    fn record(&mut self, report: RowReport) {
        match report.outcome {
            RowOutcome::Paid { .. } => self.paid += 1,
            RowOutcome::Planned => self.planned += 1,
            RowOutcome::AlreadyPaid => self.already_paid += 1,
            RowOutcome::MissingKey => self.missing_key += 1,
            RowOutcome::Failed { .. } => self.failed += 1,
        }
        self.rows.push(report);
    }
}

/// Pays the rows of a payment sheet through a gateway
pub struct PaymentRunner {
    sheet: Arc<dyn PaymentSheet>,
    /// Absent for dry runs built with [`PaymentRunner::dry_run`]
    gateway: Option<Arc<dyn PaymentGateway>>,
    options: RunOptions,
}

impl PaymentRunner {
    pub fn new(
        sheet: Arc<dyn PaymentSheet>,
        gateway: Arc<dyn PaymentGateway>,
        options: RunOptions,
    ) -> Self {
        Self {
            sheet,
            gateway: Some(gateway),
            options,
        }
    }

    /// Runner that only plans payments, without a bank client
    pub fn dry_run(sheet: Arc<dyn PaymentSheet>, options: RunOptions) -> Self {
        Self {
            sheet,
            gateway: None,
            options: RunOptions {
                dry_run: true,
                ..options
            },
        }
    }

    /// Execute one payment run
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let date = format_sheet_date(self.options.date);
        let records = self.sheet.records().await?;

        let due: Vec<(usize, PaymentRecord)> = records
            .into_iter()
            .enumerate()
            .filter(|(_, record)| record.is_due_on(self.options.date))
            .collect();

        let mut summary = RunSummary {
            due: due.len(),
            ..Default::default()
        };

        if due.is_empty() {
            info!(date = %date, "No payments due");
            return Ok(summary);
        }

        info!(date = %date, due = due.len(), dry_run = self.options.dry_run, "Payments due");

        let token = match &self.gateway {
            Some(gateway) if !self.options.dry_run => Some(gateway.access_token().await?),
            _ => None,
        };

        for (index, record) in due {
            let report = self.process_row(index, &record, token.as_ref()).await;
            summary.record(report);
        }

        info!(
            due = summary.due,
            paid = summary.paid,
            planned = summary.planned,
            already_paid = summary.already_paid,
            missing_key = summary.missing_key,
            failed = summary.failed,
            "Payment run finished"
        );

        Ok(summary)
    }

    async fn process_row(
        &self,
        index: usize,
        record: &PaymentRecord,
        token: Option<&AccessToken>,
    ) -> RowReport {
        let mut report = RowReport {
            index,
            beneficiary: record.beneficiary.clone(),
            key: None,
            outcome: RowOutcome::AlreadyPaid,
        };

        if record.is_already_paid() {
            info!(
                beneficiary = %record.beneficiary,
                request_code = %record.request_code,
                "Skipping payment, request code already present"
            );
            return report;
        }

        if record.pix_key.trim().is_empty() {
            warn!(beneficiary = %record.beneficiary, "Skipping payment, PIX key missing");
            report.outcome = RowOutcome::MissingKey;
            return report;
        }

        let amount = match parse_amount(&record.amount) {
            Ok(amount) => amount,
            Err(e) => {
                error!(beneficiary = %record.beneficiary, error = %e, "Cannot pay row");
                report.outcome = RowOutcome::Failed {
                    reason: e.to_string(),
                };
                return report;
            }
        };

        let key = classify(&record.pix_key);
        let payment_key = key.payment_key();
        report.key = Some(key.clone());

        if key.key_type == PixKeyType::Unknown || payment_key.is_empty() {
            error!(
                beneficiary = %record.beneficiary,
                key = %record.pix_key,
                "Cannot identify PIX key type"
            );
            report.outcome = RowOutcome::Failed {
                reason: format!("unidentified PIX key '{}'", record.pix_key),
            };
            return report;
        }

        if !key.is_valid {
            warn!(
                beneficiary = %record.beneficiary,
                key_type = %key.key_type,
                key = %payment_key,
                "PIX key failed validation, submitting anyway"
            );
        }

        let payment = PixPayment::to_key(amount, record.description.clone(), payment_key);

        let (Some(token), Some(gateway)) = (token, &self.gateway) else {
            info!(
                beneficiary = %record.beneficiary,
                key_type = %key.key_type,
                payload = %serde_json::to_string(&payment).unwrap_or_default(),
                "Dry run, payment not submitted"
            );
            report.outcome = RowOutcome::Planned;
            return report;
        };

        report.outcome = match gateway.submit(token, &payment).await {
            Ok(receipt) => {
                info!(
                    beneficiary = %record.beneficiary,
                    amount = %payment.amount,
                    request_code = ?receipt.request_code,
                    "Payment submitted"
                );
                if let Some(code) = &receipt.request_code {
                    self.write_request_code(index, code).await;
                }
                RowOutcome::Paid {
                    request_code: receipt.request_code,
                }
            }
            Err(e) => {
                error!(beneficiary = %record.beneficiary, error = %e, "Payment failed");
                RowOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        report
    }

    /// Record the request code so the row is skipped on the next run.
    /// A write failure leaves the payment itself successful.
    async fn write_request_code(&self, index: usize, code: &str) {
        let row = sheet_row(index);
        let column = self.options.request_code_column;
        match self.sheet.update_cell(row, column, code).await {
            Ok(()) => info!(row, column, request_code = %code, "Request code written to sheet"),
            Err(e) => error!(
                row,
                column,
                request_code = %code,
                error = %e,
                "Failed to write request code to sheet; record it manually to avoid paying twice"
            ),
        }
    }
}
