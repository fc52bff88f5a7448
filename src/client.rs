// Authenticated HTTP client shared by the Calendar and Gmail services

use crate::error::{friendly_api_error, ApiError, ApiResult};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

pub struct GoogleClient {
    http_client: reqwest::Client,
    access_token: String,
    base_url: String,
    service: &'static str,
}

impl GoogleClient {
    pub fn new(service: &'static str, base_url: impl Into<String>, access_token: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            access_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service,
        }
    }

    pub fn calendar(access_token: String) -> Self {
        Self::new("Calendar", CALENDAR_API_BASE, access_token)
    }

    pub fn gmail(access_token: String) -> Self {
        Self::new("Gmail", GMAIL_API_BASE, access_token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let builder = self
            .http_client
            .get(self.url(path))
            .query(query)
            .bearer_auth(&self.access_token);

        let body = self.execute(builder).await?;
        self.parse(&body)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let builder = self
            .http_client
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body);

        let body = self.execute(builder).await?;
        self.parse(&body)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let builder = self
            .http_client
            .put(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body);

        let body = self.execute(builder).await?;
        self.parse(&body)
    }

    /// Issue a DELETE and return the raw response body (Google answers success with an empty body)
    pub async fn delete(&self, path: &str) -> ApiResult<String> {
        let builder = self
            .http_client
            .delete(self.url(path))
            .bearer_auth(&self.access_token);

        self.execute(builder).await
    }

    async fn execute(&self, builder: RequestBuilder) -> ApiResult<String> {
        let resp = builder.send().await?;
        let status = resp.status();
        tracing::debug!("{} API response status: {}", self.service, status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limited by {} API", self.service);
        }

        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = friendly_api_error(self.service, status, &body);
            tracing::error!("{} API error: {}", self.service, message);
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    fn parse<T: DeserializeOwned>(&self, body: &str) -> ApiResult<T> {
        // Empty successful responses still need to satisfy the schema
        let body = if body.trim().is_empty() { "{}" } else { body };
        serde_json::from_str(body).map_err(|e| {
            ApiError::Parse(format!("Failed to parse {} response: {} - {}", self.service, e, body))
        })
    }
}

/// Percent-encode a single path segment (calendar ids contain '@' and '#')
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// First 20 characters of a token, for log lines
pub(crate) fn token_preview(token: &str) -> String {
    token.chars().take(20).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_segment_encodes_calendar_ids() {
        assert_eq!(segment("primary"), "primary");
        assert_eq!(
            segment("abc@group.calendar.google.com"),
            "abc%40group.calendar.google.com"
        );
        assert_eq!(segment("en.usa#holiday"), "en.usa%23holiday");
    }

    #[test]
    fn test_token_preview_respects_char_boundaries() {
        assert_eq!(token_preview("ya29.short"), "ya29.short");
        assert_eq!(token_preview("ya29.a0AfB_byC1234567890xyz"), "ya29.a0AfB_byC123456");
        // byte 20 falls inside a two-byte character
        let edited = "ya29.ééééééééééééééééé";
        assert_eq!(token_preview(edited).chars().count(), 20);
        assert!(edited.starts_with(&token_preview(edited)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GoogleClient::new("Calendar", "http://localhost:1234/", "t".to_string());
        assert_eq!(client.base_url(), "http://localhost:1234");
        assert_eq!(client.url("/users/me"), "http://localhost:1234/users/me");
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/me/profile")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"emailAddress": "me@example.com"}"#)
            .create_async()
            .await;

        let client = GoogleClient::new("Gmail", server.url(), "test_token".to_string());
        let value: Value = client.get("/users/me/profile", &[]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value["emailAddress"], "me@example.com");
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me/labels")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 401, "message": "Unauthorized"}}"#)
            .create_async()
            .await;

        let client = GoogleClient::new("Gmail", server.url(), "bad_token".to_string());
        let result: ApiResult<Value> = client.get("/users/me/labels", &[]).await;

        match result {
            Err(ApiError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Gmail: Unauthorized");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_returns_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/calendars/primary/events/evt1")
            .with_status(204)
            .create_async()
            .await;

        let client = GoogleClient::new("Calendar", server.url(), "t".to_string());
        let body = client.delete("/calendars/primary/events/evt1").await.unwrap();
        assert!(body.is_empty());
    }
}
