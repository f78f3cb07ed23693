//! Runtime configuration model.
//!
//! Loading lives in `scanbot-infrastructure::ConfigService`; this module only
//! defines the shape and validation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScanBotError};
use crate::scanner::{ScanFunction, ScannerCatalog};

/// Scan hardware is slow; a long ADF batch must not time out.
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 20 * 60;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

/// Document-store connection settings.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PaperlessConfig {
    pub endpoint: String,
    pub token: String,
}

impl fmt::Debug for PaperlessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaperlessConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &redact(&self.token))
            .finish()
    }
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub telegram_token: String,
    #[serde(default)]
    pub allowed_users: Vec<i64>,
    pub scanner_endpoint: String,
    pub scanner_device_id: String,
    #[serde(default)]
    pub paperless: Option<PaperlessConfig>,
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default = "ScannerCatalog::default_functions")]
    pub functions: Vec<ScanFunction>,
}

fn default_scan_timeout() -> u64 {
    DEFAULT_SCAN_TIMEOUT_SECS
}

fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

impl BotConfig {
    /// Checks that every mandatory setting is present.
    pub fn validate(&self) -> Result<()> {
        require("telegram_token", &self.telegram_token)?;
        require("scanner_endpoint", &self.scanner_endpoint)?;
        require("scanner_device_id", &self.scanner_device_id)?;
        if let Some(paperless) = &self.paperless {
            require("paperless.endpoint", &paperless.endpoint)?;
            require("paperless.token", &paperless.token)?;
        }
        if self.functions.is_empty() {
            return Err(ScanBotError::config("no scan functions configured"));
        }
        if self.allowed_users.is_empty() {
            return Err(ScanBotError::config(
                "allowed_users is empty; nobody could use the bot",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &redact(&self.telegram_token))
            .field("allowed_users", &self.allowed_users)
            .field("scanner_endpoint", &self.scanner_endpoint)
            .field("scanner_device_id", &self.scanner_device_id)
            .field("paperless", &self.paperless)
            .field("scan_timeout_secs", &self.scan_timeout_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("functions", &self.functions.len())
            .finish()
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ScanBotError::config(format!("{name} must not be empty")))
    } else {
        Ok(())
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BotConfig {
        BotConfig {
            telegram_token: "123:abc".to_string(),
            allowed_users: vec![42],
            scanner_endpoint: "http://scanner:8080".to_string(),
            scanner_device_id: "epson".to_string(),
            paperless: None,
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            functions: ScannerCatalog::default_functions(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_device() {
        let mut config = sample();
        config.scanner_device_id = "  ".to_string();
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let mut config = sample();
        config.paperless = Some(PaperlessConfig {
            endpoint: "http://paperless".to_string(),
            token: "s3cret".to_string(),
        });
        let printed = format!("{config:?}");
        assert!(!printed.contains("123:abc"));
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("http://paperless"));
    }

    #[test]
    fn test_toml_defaults() {
        let config: BotConfig = toml::from_str(
            r#"
            telegram_token = "t"
            allowed_users = [1, 2]
            scanner_endpoint = "http://scanner"
            scanner_device_id = "dev"
            "#,
        )
        .unwrap();

        assert_eq!(config.scan_timeout_secs, DEFAULT_SCAN_TIMEOUT_SECS);
        assert_eq!(config.functions.len(), 8);
        assert!(config.paperless.is_none());
    }
}
