//! Banking API integration
//!
//! [`PaymentGateway`] is the seam between the payment run and the bank:
//! one call obtains an access token, the other submits a PIX transfer
//! addressed by key.

mod inter;

pub use inter::InterClient;

use async_trait::async_trait;
use pixpay_common::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Banking API errors
#[derive(Debug, Error)]
pub enum BankError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Client certificate error: {0}")]
    CertificateError(String),

    #[error("Authentication failed {0}: {1}")]
    AuthError(u16, String),

    #[error("Token response has no access_token")]
    MissingToken,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// OAuth bearer token; never printed in full
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} chars>)", self.0.len())
    }
}

/// PIX transfer request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PixPayment {
    /// Decimal amount with two places, e.g. `"150.00"`
    #[serde(rename = "valor")]
    pub amount: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "destinatario")]
    pub recipient: Recipient,
}

/// Payment destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// Always `"CHAVE"`: the recipient is addressed by PIX key
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "chave")]
    pub key: String,
}

impl PixPayment {
    /// Transfer to a PIX key as formatted by `ClassifiedKey::payment_key`
    pub fn to_key(amount: Amount, description: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            amount: amount.to_string(),
            description: description.into(),
            recipient: Recipient {
                kind: "CHAVE".to_string(),
                key: key.into(),
            },
        }
    }
}

/// Successful submission response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentReceipt {
    /// Bank-side identifier of the payment request
    #[serde(rename = "codigoSolicitacao", default)]
    pub request_code: Option<String>,

    /// Bank's classification of the outcome (e.g. `APROVACAO`, `PAGAMENTO`)
    #[serde(rename = "tipoRetorno", default)]
    pub return_type: Option<String>,
}

/// Bank able to pay PIX transfers
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Obtain an access token for payment submission
    async fn access_token(&self) -> Result<AccessToken, BankError>;

    /// Submit one transfer; only a success response yields `Ok`
    async fn submit(
        &self,
        token: &AccessToken,
        payment: &PixPayment,
    ) -> Result<PaymentReceipt, BankError>;
}
