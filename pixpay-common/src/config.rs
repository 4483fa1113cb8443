//! Configuration loading and config file resolution
//!
//! All settings live in one TOML bootstrap file:
//!
//! ```toml
//! [bank]
//! client_id = "..."
//! client_secret = "..."
//! account = "..."
//! cert_path = "/etc/pixpay/inter.crt"
//! key_path = "/etc/pixpay/inter.key"
//!
//! [sheet]
//! spreadsheet_id = "..."
//! access_token = "..."
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Secrets can be kept out of the file with `PIXPAY_CLIENT_SECRET` and
//! `PIXPAY_SHEET_TOKEN`, which override the file values.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PIXPAY_CONFIG";
/// Environment override for `bank.client_secret`
pub const CLIENT_SECRET_ENV_VAR: &str = "PIXPAY_CLIENT_SECRET";
/// Environment override for `sheet.access_token`
pub const SHEET_TOKEN_ENV_VAR: &str = "PIXPAY_SHEET_TOKEN";

const CONFIG_FILE_NAME: &str = "pixpay.toml";

/// Complete application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bank: BankConfig,
    pub sheet: SheetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Banking API credentials and endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BankConfig {
    #[serde(default = "default_bank_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// Checking account sent in the `x-conta-corrente` header
    #[serde(default)]
    pub account: String,

    /// OAuth scope requested for the access token
    #[serde(default = "default_bank_scope")]
    pub scope: String,

    /// Client certificate (PEM) for mutual TLS
    #[serde(default)]
    pub cert_path: Option<PathBuf>,

    /// Client private key (PEM) for mutual TLS
    #[serde(default)]
    pub key_path: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Spreadsheet location and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Worksheet (tab) holding the payments
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// OAuth bearer token with spreadsheet read/write scope
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_sheets_api_url")]
    pub api_base_url: String,

    /// 1-based column receiving the bank's request code
    #[serde(default = "default_request_code_column")]
    pub request_code_column: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bank_base_url() -> String {
    "https://cdpj.partners.bancointer.com.br".to_string()
}

fn default_bank_scope() -> String {
    "pagamento-pix.write".to_string()
}

fn default_sheet_name() -> String {
    "PIX Pagamentos".to_string()
}

fn default_sheets_api_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_request_code_column() -> u32 {
    7 // column G
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text without touching the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Replace secrets with their environment values when set and non-blank
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = env_value(CLIENT_SECRET_ENV_VAR) {
            debug!("bank.client_secret taken from {}", CLIENT_SECRET_ENV_VAR);
            self.bank.client_secret = secret;
        }

        if let Some(token) = env_value(SHEET_TOKEN_ENV_VAR) {
            debug!("sheet.access_token taken from {}", SHEET_TOKEN_ENV_VAR);
            self.sheet.access_token = token;
        }
    }
}

impl BankConfig {
    /// Check that everything needed to submit payments is present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if !is_set(&self.base_url) {
            missing.push("bank.base_url");
        }
        if !is_set(&self.client_id) {
            missing.push("bank.client_id");
        }
        if !is_set(&self.client_secret) {
            missing.push("bank.client_secret (or PIXPAY_CLIENT_SECRET)");
        }
        if !is_set(&self.account) {
            missing.push("bank.account");
        }
        report_missing(&missing)?;

        if self.cert_path.is_some() != self.key_path.is_some() {
            return Err(Error::Config(
                "bank.cert_path and bank.key_path must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

impl SheetConfig {
    /// Check that the spreadsheet can be reached and updated
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if !is_set(&self.spreadsheet_id) {
            missing.push("sheet.spreadsheet_id");
        }
        if !is_set(&self.sheet_name) {
            missing.push("sheet.sheet_name");
        }
        if !is_set(&self.access_token) {
            missing.push("sheet.access_token (or PIXPAY_SHEET_TOKEN)");
        }
        report_missing(&missing)?;

        if self.request_code_column == 0 {
            return Err(Error::Config(
                "sheet.request_code_column is 1-based and cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Config file resolution, highest priority first:
/// 1. Command-line argument
/// 2. `PIXPAY_CONFIG` environment variable
/// 3. `pixpay.toml` in the working directory
/// 4. Platform config directory (`~/.config/pixpay/pixpay.toml` on Linux)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = env_value(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: Working directory
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    // Priority 4: Platform config directory
    if let Some(path) = default_config_path() {
        if path.exists() {
            return Ok(path);
        }
    }

    Err(Error::Config(format!(
        "No configuration file found. Provide one of:\n\
         1. Command line: --config /path/to/{name}\n\
         2. Environment: {env}=/path/to/{name}\n\
         3. Working directory: ./{name}\n\
         4. User config: {user}",
        name = CONFIG_FILE_NAME,
        env = CONFIG_ENV_VAR,
        user = default_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<no config directory on this platform>".to_string()),
    )))
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pixpay").join(CONFIG_FILE_NAME))
}

/// Non-empty, non-whitespace
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_set(v))
}

fn report_missing(missing: &[&str]) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Missing required settings: {}",
            missing.join(", ")
        )))
    }
}
