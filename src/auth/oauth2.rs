// Google OAuth2 installed-app flow - implemented with reqwest directly

use crate::client::token_preview;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth2 error: {0}")]
    OAuth2(String),
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),
    #[error("Client secrets error: {0}")]
    Secrets(String),
    #[error("Token file error: {0}")]
    TokenFile(String),
    #[error("OAuth callback error: {0}")]
    Callback(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

/// OAuth client registration as downloaded from the Google Cloud Console (client_secret.json)
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| AuthError::Secrets(format!("Failed to parse client secrets: {}", e)))?;

        file.installed
            .or(file.web)
            .ok_or_else(|| AuthError::Secrets("Client secrets must contain an 'installed' or 'web' section".to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Secrets(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

/// Authorization request that is waiting for the user's consent
pub struct PendingAuth {
    pub url: String,
    pub state: String,
    verifier: String,
    redirect_uri: String,
}

pub struct GoogleAuth {
    secrets: ClientSecrets,
    http_client: reqwest::Client,
}

impl GoogleAuth {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self {
            secrets,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    fn generate_pkce() -> (String, String) {
        use rand::RngCore;
        use sha2::{Digest, Sha256};

        // Verifier must be 43-128 chars of URL-safe text; 32 random bytes encode to 43
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let verifier = base64_url_encode(&bytes);

        let mut sha = Sha256::new();
        sha.update(verifier.as_bytes());
        let challenge = base64_url_encode(&sha.finalize());

        (verifier, challenge)
    }

    /// Build the consent URL for the given redirect and scopes
    pub fn start_auth_flow(&self, redirect_uri: &str, scopes: &[String]) -> PendingAuth {
        let (verifier, challenge) = Self::generate_pkce();
        let state = format!("{:016x}", rand::random::<u64>());

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&code_challenge={}&code_challenge_method=S256&state={}",
            self.secrets.auth_uri,
            urlencoding::encode(&self.secrets.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&challenge),
            urlencoding::encode(&state)
        );

        PendingAuth {
            url,
            state,
            verifier,
            redirect_uri: redirect_uri.to_string(),
        }
    }

    pub async fn exchange_code(
        &self,
        pending: PendingAuth,
        code: &str,
        received_state: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        // A redirect without the state we sent is treated like a forged one
        if received_state != Some(pending.state.as_str()) {
            return Err(AuthError::OAuth2("State mismatch - possible CSRF attack".to_string()));
        }

        tracing::info!("Exchanging authorization code for tokens...");

        let resp = self
            .http_client
            .post(&self.secrets.token_uri)
            .form(&[
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("code", code),
                ("code_verifier", &pending.verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", &pending.redirect_uri),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::info!("Token response status: {}", status);

        if !status.is_success() {
            return Err(AuthError::OAuth2(format!("Token exchange failed ({}): {}", status, body)));
        }

        let token_resp: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::OAuth2(format!("Failed to parse token response: {}", e)))?;

        tracing::debug!(
            "Got access token: {}...",
            token_preview(&token_resp.access_token)
        );

        Ok(token_resp)
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        refresh_with(
            &self.http_client,
            &self.secrets.token_uri,
            &self.secrets.client_id,
            &self.secrets.client_secret,
            refresh_token,
        )
        .await
    }
}

/// Exchange a refresh token for a new access token at `token_uri`
pub async fn refresh_with(
    http_client: &reqwest::Client,
    token_uri: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse, AuthError> {
    let resp = http_client
        .post(token_uri)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let error_text = resp.text().await.unwrap_or_default();
        return Err(AuthError::TokenRefresh(format!("HTTP {} - {}", status, error_text)));
    }

    let body = resp.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| AuthError::TokenRefresh(format!("Failed to parse token response: {}", e)))
}

fn base64_url_encode(input: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(input)
}
