// Runtime configuration: where tokens live and which endpoints to talk to

use crate::auth::{CredentialManager, CALENDAR_SCOPES, MAIL_SCOPES};
use crate::client::{CALENDAR_API_BASE, GMAIL_API_BASE};
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the token caches and client secrets
    pub token_dir: PathBuf,
    pub calendar_token_file: String,
    pub mail_token_file: String,
    pub calendar_client_secret_file: String,
    pub mail_client_secret_file: String,
    /// Port for the consent redirect listener, 0 for any free port
    pub callback_port: u16,
    pub callback_timeout_secs: u64,
    pub calendar_api_base: String,
    pub gmail_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_dir: PathBuf::from("."),
            calendar_token_file: "calendar_token.json".to_string(),
            mail_token_file: "mail_token.json".to_string(),
            calendar_client_secret_file: "client_secret.json".to_string(),
            mail_client_secret_file: "client_secret.json".to_string(),
            callback_port: 0,
            callback_timeout_secs: 120,
            calendar_api_base: CALENDAR_API_BASE.to_string(),
            gmail_api_base: GMAIL_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by GAP_* environment variables
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let mut config = Config::default();

        if let Some(dir) = lookup("GAP_TOKEN_DIR") {
            config.token_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("GAP_CALENDAR_SECRET") {
            config.calendar_client_secret_file = file;
        }
        if let Some(file) = lookup("GAP_MAIL_SECRET") {
            config.mail_client_secret_file = file;
        }
        if let Some(port) = lookup("GAP_CALLBACK_PORT") {
            config.callback_port = port
                .parse()
                .map_err(|_| ApiError::validation(format!("Invalid GAP_CALLBACK_PORT: {}", port)))?;
        }
        if let Some(secs) = lookup("GAP_CALLBACK_TIMEOUT") {
            config.callback_timeout_secs = secs
                .parse()
                .map_err(|_| ApiError::validation(format!("Invalid GAP_CALLBACK_TIMEOUT: {}", secs)))?;
        }

        Ok(config)
    }

    pub fn calendar_token_path(&self) -> PathBuf {
        self.token_dir.join(&self.calendar_token_file)
    }

    pub fn mail_token_path(&self) -> PathBuf {
        self.token_dir.join(&self.mail_token_file)
    }

    pub fn calendar_credentials(&self) -> CredentialManager {
        CredentialManager::new(
            self.calendar_token_path(),
            self.token_dir.join(&self.calendar_client_secret_file),
            CALENDAR_SCOPES.iter().map(|s| s.to_string()).collect(),
        )
        .with_callback(self.callback_port, Duration::from_secs(self.callback_timeout_secs))
    }

    pub fn mail_credentials(&self) -> CredentialManager {
        CredentialManager::new(
            self.mail_token_path(),
            self.token_dir.join(&self.mail_client_secret_file),
            MAIL_SCOPES.iter().map(|s| s.to_string()).collect(),
        )
        .with_callback(self.callback_port, Duration::from_secs(self.callback_timeout_secs))
    }
}
