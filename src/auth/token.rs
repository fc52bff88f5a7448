// Cached OAuth token file and the credential lifecycle built on top of it

use super::callback::CallbackListener;
use super::oauth2::{refresh_with, ClientSecrets, GoogleAuth, TokenResponse};
use super::AuthError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Tokens within this window of their expiry are treated as expired
const REFRESH_THRESHOLD_SECS: i64 = 225;

/// Authorized-user token file, compatible with the JSON written by Google's auth libraries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credentials {
    fn from_token_response(resp: TokenResponse, secrets: &ClientSecrets, scopes: &[String]) -> Self {
        let scopes = match resp.scope {
            Some(granted) => granted.split_whitespace().map(str::to_string).collect(),
            None => scopes.to_vec(),
        };

        Self {
            token: Some(resp.access_token),
            refresh_token: resp.refresh_token,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes,
            expiry: resp.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            extra: Map::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::TokenFile(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| AuthError::TokenFile(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Overwrite `path` with this credential
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuthError::TokenFile(format!("Failed to create token dir: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AuthError::TokenFile(format!("Failed to serialize token: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| AuthError::TokenFile(format!("Failed to write {}: {}", path.display(), e)))?;
        tracing::info!("Token stored at: {:?}", path);
        Ok(())
    }

    pub fn expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() + Duration::seconds(REFRESH_THRESHOLD_SECS) >= expiry,
            None => false,
        }
    }

    pub fn valid(&self) -> bool {
        self.token.is_some() && !self.expired()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    async fn refresh(&mut self, http_client: &reqwest::Client) -> Result<(), AuthError> {
        let refresh_token = self
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::TokenRefresh("No refresh token in token data".to_string()))?;

        let resp = refresh_with(
            http_client,
            &self.token_uri,
            &self.client_id,
            &self.client_secret,
            &refresh_token,
        )
        .await?;

        self.token = Some(resp.access_token);
        if let Some(new_refresh) = resp.refresh_token {
            self.refresh_token = Some(new_refresh);
        }
        self.expiry = Some(Utc::now() + Duration::seconds(resp.expires_in.unwrap_or(3600)));
        Ok(())
    }
}

/// Produces a valid credential for one service, using the token cache at `token_path`
pub struct CredentialManager {
    token_path: PathBuf,
    client_secret_path: PathBuf,
    scopes: Vec<String>,
    callback_port: u16,
    callback_timeout: std::time::Duration,
    http_client: reqwest::Client,
}

impl CredentialManager {
    pub fn new(token_path: PathBuf, client_secret_path: PathBuf, scopes: Vec<String>) -> Self {
        Self {
            token_path,
            client_secret_path,
            scopes,
            callback_port: 0,
            callback_timeout: std::time::Duration::from_secs(120),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_callback(mut self, port: u16, timeout: std::time::Duration) -> Self {
        self.callback_port = port;
        self.callback_timeout = timeout;
        self
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Load the cached token, refreshing it or running the consent flow as needed
    pub async fn credentials(&self) -> Result<Credentials, AuthError> {
        let cached = if self.token_path.exists() {
            match Credentials::from_file(&self.token_path) {
                Ok(creds) => Some(creds),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable token cache: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if let Some(creds) = &cached {
            if creds.valid() {
                tracing::debug!("Using cached token from {:?}", self.token_path);
                return Ok(creds.clone());
            }
        }

        let creds = match cached {
            Some(mut creds) if creds.expired() && creds.refresh_token.is_some() => {
                tracing::info!("Refreshing expired token from {:?}", self.token_path);
                creds.refresh(&self.http_client).await?;
                creds
            }
            _ => self.run_consent_flow().await?,
        };

        creds.save(&self.token_path)?;
        Ok(creds)
    }

    /// Interactive installed-app flow: browser consent redirected to a local listener
    pub async fn run_consent_flow(&self) -> Result<Credentials, AuthError> {
        let secrets = ClientSecrets::from_file(&self.client_secret_path)?;
        let auth = GoogleAuth::new(secrets);

        let listener = CallbackListener::bind(self.callback_port)?;
        let pending = auth.start_auth_flow(&listener.redirect_uri(), &self.scopes);

        tracing::info!("Please visit this URL to authorize access: {}", pending.url);
        if let Err(e) = open::that(&pending.url) {
            tracing::warn!("Failed to open browser: {}", e);
        }

        let timeout = self.callback_timeout;
        let callback = tokio::task::spawn_blocking(move || listener.wait(timeout))
            .await
            .map_err(|e| AuthError::Callback(format!("Task error: {}", e)))??;

        let resp = auth
            .exchange_code(pending, &callback.code, callback.state.as_deref())
            .await?;

        Ok(Credentials::from_token_response(resp, auth.secrets(), &self.scopes))
    }
}
