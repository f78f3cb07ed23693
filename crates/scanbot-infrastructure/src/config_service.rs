//! Configuration loading.
//!
//! Priority:
//! 1. Explicit TOML file passed on the command line
//! 2. `~/.config/scanbot/config.toml` if it exists
//! 3. Environment variables (a `.env` file in the working directory is honoured)

use scanbot_core::config::{
    BotConfig, DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_SCAN_TIMEOUT_SECS, PaperlessConfig,
};
use scanbot_core::error::{Result, ScanBotError};
use scanbot_core::scanner::ScannerCatalog;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_ALLOWED_USERS: &str = "ALLOWED_TELEGRAM_USERS";
pub const ENV_SCANNER_ENDPOINT: &str = "SCANNER_ENDPOINT";
pub const ENV_SCANNER_DEVICE_ID: &str = "SCANNER_DEVICE_ID";
pub const ENV_PAPERLESS_ENDPOINT: &str = "PAPERLESS_ENDPOINT";
pub const ENV_PAPERLESS_TOKEN: &str = "PAPERLESS_TOKEN";
pub const ENV_SCAN_TIMEOUT: &str = "SCAN_TIMEOUT_SECS";

/// Loads and validates [`BotConfig`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigService;

impl ConfigService {
    pub fn new() -> Self {
        Self
    }

    /// Resolves the configuration following the documented priority.
    pub fn load(&self, path: Option<&Path>) -> Result<BotConfig> {
        let config = match path {
            Some(path) => self.load_file(path)?,
            None => match default_config_path().filter(|path| path.exists()) {
                Some(path) => self.load_file(&path)?,
                None => {
                    if let Ok(dotenv) = dotenvy::dotenv() {
                        tracing::debug!("[Config] Loaded environment from {:?}", dotenv);
                    }
                    Self::from_lookup(|key| std::env::var(key).ok())?
                }
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    pub fn load_file(&self, path: &Path) -> Result<BotConfig> {
        tracing::info!("[Config] Reading configuration from {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| {
            ScanBotError::config(format!(
                "Failed to read configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Builds the configuration from environment-style key lookups.
    pub fn from_lookup<F>(lookup: F) -> Result<BotConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ScanBotError::config(format!("{key} is not set")))
        };

        let paperless = match (lookup(ENV_PAPERLESS_ENDPOINT), lookup(ENV_PAPERLESS_TOKEN)) {
            (Some(endpoint), Some(token)) if !endpoint.trim().is_empty() => {
                Some(PaperlessConfig {
                    endpoint: endpoint.trim().to_string(),
                    token: token.trim().to_string(),
                })
            }
            _ => None,
        };

        let scan_timeout_secs = match lookup(ENV_SCAN_TIMEOUT) {
            Some(value) => value.trim().parse().map_err(|_| {
                ScanBotError::config(format!("{ENV_SCAN_TIMEOUT} must be a number of seconds"))
            })?,
            None => DEFAULT_SCAN_TIMEOUT_SECS,
        };

        Ok(BotConfig {
            telegram_token: required(ENV_TELEGRAM_TOKEN)?,
            allowed_users: parse_allowed_users(&lookup(ENV_ALLOWED_USERS).unwrap_or_default()),
            scanner_endpoint: required(ENV_SCANNER_ENDPOINT)?,
            scanner_device_id: required(ENV_SCANNER_DEVICE_ID)?,
            paperless,
            scan_timeout_secs,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            functions: ScannerCatalog::default_functions(),
        })
    }
}

/// Parses a `;`-separated list of user ids, skipping entries that are not numbers.
pub fn parse_allowed_users(raw: &str) -> Vec<i64> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<i64>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("[Config] Failed to parse user {} ({})", entry, e);
                None
            }
        })
        .collect()
}

/// Returns the path to the configuration file: ~/.config/scanbot/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scanbot").join("config.toml"))
}
