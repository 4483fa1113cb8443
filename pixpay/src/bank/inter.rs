//! Banco Inter API client
//!
//! Business-account API authenticated with OAuth client credentials. In
//! production every call goes over mutual TLS with the certificate and key
//! issued by the bank; both are optional so the client can target a sandbox.

use super::{AccessToken, BankError, PaymentGateway, PaymentReceipt, PixPayment};
use async_trait::async_trait;
use pixpay_common::config::BankConfig;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const TOKEN_PATH: &str = "/oauth/v2/token";
const PIX_PATH: &str = "/banking/v2/pix";
const ACCOUNT_HEADER: &str = "x-conta-corrente";
const USER_AGENT: &str = concat!("pixpay/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Banco Inter payment gateway
pub struct InterClient {
    http_client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    account: String,
}

impl InterClient {
    pub fn new(config: &BankConfig) -> Result<Self, BankError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs));

        if let (Some(cert_path), Some(key_path)) = (&config.cert_path, &config.key_path) {
            builder = builder.identity(load_identity(cert_path, key_path)?);
            tracing::debug!(cert = %cert_path.display(), "Mutual TLS identity loaded");
        }

        let http_client = builder
            .build()
            .map_err(|e| BankError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            account: config.account.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Certificate and key PEM files combined into one client identity
fn load_identity(cert_path: &Path, key_path: &Path) -> Result<reqwest::Identity, BankError> {
    let read = |path: &Path| {
        std::fs::read(path)
            .map_err(|e| BankError::CertificateError(format!("{}: {}", path.display(), e)))
    };

    let mut pem = read(cert_path)?;
    if !pem.ends_with(b"\n") {
        pem.push(b'\n');
    }
    pem.extend(read(key_path)?);

    reqwest::Identity::from_pem(&pem).map_err(|e| BankError::CertificateError(e.to_string()))
}

#[async_trait]
impl PaymentGateway for InterClient {
    async fn access_token(&self) -> Result<AccessToken, BankError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        tracing::debug!(scope = %self.scope, "Requesting bank access token");

        let response = self
            .http_client
            .post(self.url(TOKEN_PATH))
            .form(&params)
            .send()
            .await
            .map_err(|e| BankError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BankError::AuthError(status.as_u16(), error_text));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BankError::ParseError(e.to_string()))?;

        let access_token = token
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(BankError::MissingToken)?;

        tracing::info!(expires_in = ?token.expires_in, "Bank access token obtained");
        Ok(AccessToken::new(access_token))
    }

    async fn submit(
        &self,
        token: &AccessToken,
        payment: &PixPayment,
    ) -> Result<PaymentReceipt, BankError> {
        tracing::debug!(
            amount = %payment.amount,
            key = %payment.recipient.key,
            "Submitting PIX payment"
        );

        let response = self
            .http_client
            .post(self.url(PIX_PATH))
            .bearer_auth(token.secret())
            .header(ACCOUNT_HEADER, &self.account)
            .json(payment)
            .send()
            .await
            .map_err(|e| BankError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != StatusCode::OK {
            return Err(BankError::ApiError(status.as_u16(), body));
        }

        // The transfer went through even if the body is unreadable; report it
        // as paid without a request code rather than as a failure.
        match serde_json::from_str::<PaymentReceipt>(&body) {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                tracing::warn!(error = %e, body = %body, "Unreadable payment response");
                Ok(PaymentReceipt::default())
            }
        }
    }
}
