//! Google Sheets client
//!
//! Uses the Sheets API v4 `values` endpoints with a caller-supplied OAuth
//! bearer token. Values are read as formatted (what the user sees in the
//! sheet), so amounts and dates arrive exactly as typed.

use super::{column_letters, PaymentSheet, SheetError};
use crate::record::PaymentRecord;
use async_trait::async_trait;
use pixpay_common::config::SheetConfig;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("pixpay/", env!("CARGO_PKG_VERSION"));

/// `spreadsheets.values.get` response
#[derive(Debug, Clone, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// `spreadsheets.values.update` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

/// Google Sheets payment sheet
pub struct GoogleSheet {
    http_client: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
}

impl GoogleSheet {
    pub fn new(config: &SheetConfig) -> Result<Self, SheetError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| SheetError::NetworkError(format!("invalid API URL: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SheetError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with the range percent-encoded
    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetError::NetworkError("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    /// Sheet name as it must appear in an A1 range
    fn quoted_sheet_name(&self) -> String {
        if self.sheet_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.sheet_name.clone()
        } else {
            format!("'{}'", self.sheet_name.replace('\'', "''"))
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SheetError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SheetError::ApiError(status.as_u16(), error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl PaymentSheet for GoogleSheet {
    async fn records(&self) -> Result<Vec<PaymentRecord>, SheetError> {
        let url = self.values_url(&self.quoted_sheet_name())?;

        tracing::debug!(
            spreadsheet = %self.spreadsheet_id,
            sheet = %self.sheet_name,
            "Fetching payment sheet"
        );

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueRenderOption", "FORMATTED_VALUE")])
            .send()
            .await
            .map_err(|e| SheetError::NetworkError(e.to_string()))?;

        let range: ValueRange = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SheetError::ParseError(e.to_string()))?;

        let mut rows = range.values.into_iter().map(|row| {
            row.into_iter().map(cell_text).collect::<Vec<String>>()
        });

        let Some(headers) = rows.next() else {
            tracing::warn!(sheet = %self.sheet_name, "Payment sheet is empty");
            return Ok(Vec::new());
        };

        let records: Vec<PaymentRecord> = rows
            .map(|cells| PaymentRecord::from_row(&headers, &cells))
            .collect();

        tracing::info!(
            sheet = %self.sheet_name,
            records = records.len(),
            "Payment sheet loaded"
        );

        Ok(records)
    }

    async fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<(), SheetError> {
        if row == 0 || column == 0 {
            return Err(SheetError::OutOfRange { row, column });
        }

        let range = format!("{}!{}{}", self.quoted_sheet_name(), column_letters(column), row);
        let url = self.values_url(&range)?;
        let body = ValueUpdate {
            range: &range,
            major_dimension: "ROWS",
            values: [[value]],
        };

        let response = self
            .http_client
            .put(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .map_err(|e| SheetError::NetworkError(e.to_string()))?;

        Self::check_status(response).await?;

        tracing::debug!(range = %range, "Sheet cell updated");
        Ok(())
    }
}

/// Cells normally arrive as strings; numbers and booleans are rendered as text
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
