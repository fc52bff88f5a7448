// Gmail service: labels, drafts and profile

pub mod mime;
pub mod types;

pub use mime::Email;
pub use types::{
    LabelCache, LabelColor, MailDraft, MailDraftList, MailMessage, MailMessageBody,
    MailMessageHeader, MailMessagePart, MailUserLabel, MailUserProfile,
};

use crate::client::{segment, token_preview, GoogleClient};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::MailFormat;
use serde::Deserialize;
use serde_json::json;

/// Every draft id handed out by Gmail starts with this character
const DRAFT_ID_PREFIX: char = 'r';

#[derive(Debug, Deserialize)]
struct ListLabelsResponse {
    #[serde(default)]
    labels: Vec<MailUserLabel>,
}

pub struct MailService {
    client: GoogleClient,
    user_id: String,
    labels: LabelCache,
}

impl MailService {
    /// Obtain mail credentials (refresh or consent as needed) and build the service
    pub async fn connect(config: &Config) -> ApiResult<Self> {
        let creds = config.mail_credentials().credentials().await?;
        let token = creds
            .access_token()
            .ok_or_else(|| ApiError::Parse("Token file has no access token".to_string()))?
            .to_string();

        tracing::info!("Mail service ready (token: {}...)", token_preview(&token));
        Ok(Self::with_client(GoogleClient::new(
            "Gmail",
            config.gmail_api_base.clone(),
            token,
        )))
    }

    pub fn with_client(client: GoogleClient) -> Self {
        Self {
            client,
            user_id: "me".to_string(),
            labels: LabelCache::new(),
        }
    }

    /// Act on behalf of `user_id` instead of the authenticated user ("me")
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Name/id pairs from the last `get_labels` call
    pub fn labels(&self) -> &LabelCache {
        &self.labels
    }

    fn user_path(&self, rest: &str) -> String {
        format!("/users/{}{}", segment(&self.user_id), rest)
    }

    /// List all labels and refresh the label cache with them
    pub async fn get_labels(&self) -> ApiResult<Vec<MailUserLabel>> {
        let response: ListLabelsResponse = self.client.get(&self.user_path("/labels"), &[]).await?;

        self.labels.replace(&response.labels);
        tracing::debug!("Cached {} labels", response.labels.len());
        Ok(response.labels)
    }

    pub async fn create_label(&self, label: &MailUserLabel) -> ApiResult<MailUserLabel> {
        let created: MailUserLabel = self.client.post(&self.user_path("/labels"), label).await?;
        self.labels.insert(&created);
        tracing::info!("Created label {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn create_draft(&self, email: &Email) -> ApiResult<MailDraft> {
        let draft: MailDraft = self
            .client
            .post(&self.user_path("/drafts"), &email.prepared())
            .await?;
        tracing::info!("Created draft {}", draft.id);
        Ok(draft)
    }

    /// Fetch a draft's message. Remote errors (unknown id, revoked access) are logged and yield `None`.
    pub async fn get_draft(
        &self,
        draft_id: &str,
        format: Option<MailFormat>,
    ) -> ApiResult<Option<MailMessage>> {
        check_draft_id(draft_id)?;

        let mut query = Vec::new();
        if let Some(format) = format {
            query.push(("format", format.as_str().to_string()));
        }

        let path = self.user_path(&format!("/drafts/{}", segment(draft_id)));
        match self.client.get::<MailDraft>(&path, &query).await {
            Ok(draft) => Ok(Some(draft.message.unwrap_or_default().with_draft_id(&draft.id))),
            Err(ApiError::Api { status, message }) => {
                tracing::warn!("Failed to fetch draft {} ({}): {}", draft_id, status, message);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the draft's message with `email`
    pub async fn update_draft(&self, draft_id: &str, email: &Email) -> ApiResult<MailMessage> {
        check_draft_id(draft_id)?;

        let path = self.user_path(&format!("/drafts/{}", segment(draft_id)));
        let draft: MailDraft = self.client.put(&path, &email.prepared()).await?;
        tracing::info!("Updated draft {}", draft.id);
        Ok(draft.message.unwrap_or_default().with_draft_id(&draft.id))
    }

    /// Append `text` to the body of an existing draft. Returns `None` when the draft cannot be fetched.
    pub async fn append_draft(&self, draft_id: &str, text: &str) -> ApiResult<Option<MailMessage>> {
        let existing = match self.get_draft(draft_id, Some(MailFormat::Full)).await? {
            Some(message) => message,
            None => {
                tracing::warn!("Failed to find the draft to append to: {}", draft_id);
                return Ok(None);
            }
        };

        let updated = self
            .update_draft(draft_id, &existing.update_email(text))
            .await?;
        Ok(Some(updated))
    }

    pub async fn list_drafts(&self, page_token: Option<&str>) -> ApiResult<MailDraftList> {
        let mut query = Vec::new();
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            query.push(("pageToken", token.to_string()));
        }
        self.client.get(&self.user_path("/drafts"), &query).await
    }

    pub async fn send_draft(&self, draft_id: &str) -> ApiResult<MailMessage> {
        check_draft_id(draft_id)?;

        let sent: MailMessage = self
            .client
            .post(&self.user_path("/drafts/send"), &json!({ "id": draft_id }))
            .await?;
        tracing::info!("Sent draft {} as message {}", draft_id, sent.id);
        Ok(sent)
    }

    pub async fn get_profile(&self) -> ApiResult<MailUserProfile> {
        self.client.get(&self.user_path("/profile"), &[]).await
    }
}

fn check_draft_id(draft_id: &str) -> ApiResult<()> {
    if draft_id.starts_with(DRAFT_ID_PREFIX) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Draft id {:?} is not of the right type. It will start with an '{}'",
            draft_id, DRAFT_ID_PREFIX
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::types::URL_SAFE_LENIENT;
    use base64::Engine;
    use mockito::Matcher;

    fn service(server: &mockito::ServerGuard) -> MailService {
        MailService::with_client(GoogleClient::new("Gmail", server.url(), "test_token".to_string()))
    }

    fn draft_json(id: &str, body: &str) -> String {
        format!(
            r#"{{
                "id": "{}",
                "message": {{
                    "id": "msg1",
                    "threadId": "thr1",
                    "labelIds": ["DRAFT"],
                    "payload": {{
                        "mimeType": "text/plain",
                        "headers": [
                            {{"name": "To", "value": "to@example.com"}},
                            {{"name": "From", "value": "me@example.com"}},
                            {{"name": "Subject", "value": "Status"}}
                        ],
                        "body": {{"size": {}, "data": "{}"}}
                    }}
                }}
            }}"#,
            id,
            body.len(),
            URL_SAFE_LENIENT.encode(body.as_bytes())
        )
    }

    #[tokio::test]
    async fn test_get_labels_refreshes_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/me/labels")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_body(r#"{"labels": [
                {"id": "INBOX", "name": "INBOX", "type": "system"},
                {"id": "Label_7", "name": "Travel", "type": "user"}
            ]}"#)
            .expect(2)
            .create_async()
            .await;

        let svc = service(&server);
        svc.get_labels().await.unwrap();
        let labels = svc.get_labels().await.unwrap();

        mock.assert_async().await;
        assert_eq!(labels.len(), 2);
        assert_eq!(svc.labels().len(), 2);
        assert_eq!(svc.labels().id_for("Travel").as_deref(), Some("Label_7"));
    }

    #[tokio::test]
    async fn test_create_draft_sends_raw_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users/me/drafts")
            .match_body(Matcher::Regex(r#"^\{"message":\{"raw":"[A-Za-z0-9_\-=]+"\}\}$"#.to_string()))
            .with_status(200)
            .with_body(r#"{"id": "r123", "message": {"id": "msg1", "threadId": "thr1", "labelIds": ["DRAFT"]}}"#)
            .create_async()
            .await;

        let email = Email::new("to@example.com", "me@example.com", "Hi", "Body");
        let draft = service(&server).create_draft(&email).await.unwrap();

        mock.assert_async().await;
        assert_eq!(draft.id, "r123");
        assert_eq!(draft.message.unwrap().label_ids, vec!["DRAFT".to_string()]);
    }

    #[tokio::test]
    async fn test_get_draft_rejects_bad_prefix_without_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = service(&server).get_draft("msg1", None).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_draft_decodes_body_and_forwards_format() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/me/drafts/r42")
            .match_query(Matcher::UrlEncoded("format".into(), "full".into()))
            .with_status(200)
            .with_body(draft_json("r42", "Hello there"))
            .create_async()
            .await;

        let message = service(&server)
            .get_draft("r42", Some(MailFormat::Full))
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(message.draft_id, "r42");
        assert_eq!(message.body_text(), "Hello there");
        assert_eq!(message.header("subject"), Some("Status"));
    }

    #[tokio::test]
    async fn test_get_draft_remote_error_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me/drafts/r404")
            .with_status(404)
            .with_body(r#"{"error": {"code": 404, "message": "Requested entity was not found."}}"#)
            .create_async()
            .await;

        let result = service(&server).get_draft("r404", None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_append_draft_missing_returns_none() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/users/me/drafts/rmissing")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error": {"code": 404, "message": "Requested entity was not found."}}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = service(&server).append_draft("rmissing", "more").await.unwrap();

        get.assert_async().await;
        put.assert_async().await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_append_draft_concatenates_body() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/users/me/drafts/r42")
            .match_query(Matcher::UrlEncoded("format".into(), "full".into()))
            .with_status(200)
            .with_body(draft_json("r42", "First line"))
            .create_async()
            .await;

        let expected = Email::new("to@example.com", "me@example.com", "Status", "First line\nSecond line");
        let put = server
            .mock("PUT", "/users/me/drafts/r42")
            .match_body(Matcher::Json(json!({"message": {"raw": expected.to_base64()}})))
            .with_status(200)
            .with_body(draft_json("r42", "First line\nSecond line"))
            .create_async()
            .await;

        let updated = service(&server)
            .append_draft("r42", "\nSecond line")
            .await
            .unwrap()
            .unwrap();

        put.assert_async().await;
        assert_eq!(updated.body_text(), expected.body());
        assert_eq!(updated.draft_id, "r42");
    }

    #[tokio::test]
    async fn test_send_draft_and_profile() {
        let mut server = mockito::Server::new_async().await;
        let send = server
            .mock("POST", "/users/me/drafts/send")
            .match_body(Matcher::Json(json!({"id": "r42"})))
            .with_status(200)
            .with_body(r#"{"id": "sent1", "threadId": "thr1", "labelIds": ["SENT"]}"#)
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/users/me/profile")
            .with_status(200)
            .with_body(r#"{"emailAddress": "me@example.com", "messagesTotal": 12, "threadsTotal": 9, "historyId": "777"}"#)
            .create_async()
            .await;

        let svc = service(&server);
        let sent = svc.send_draft("r42").await.unwrap();
        let me = svc.get_profile().await.unwrap();

        send.assert_async().await;
        profile.assert_async().await;
        assert_eq!(sent.id, "sent1");
        assert_eq!(me.email_address, "me@example.com");
        assert_eq!(me.messages_total, 12);
    }

    #[tokio::test]
    async fn test_list_drafts_and_create_label() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/users/me/drafts")
            .with_status(200)
            .with_body(r#"{"drafts": [{"id": "r1", "message": {"id": "m1", "threadId": "t1"}}], "resultSizeEstimate": 1}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/users/me/labels")
            .match_body(Matcher::Json(json!({"name": "Projects"})))
            .with_status(200)
            .with_body(r#"{"id": "Label_9", "name": "Projects", "type": "user"}"#)
            .create_async()
            .await;

        let svc = service(&server);
        let drafts = svc.list_drafts(None).await.unwrap();
        let label = svc.create_label(&MailUserLabel::new("Projects")).await.unwrap();

        create.assert_async().await;
        assert_eq!(drafts.drafts[0].id, "r1");
        assert_eq!(label.id, "Label_9");
        assert_eq!(svc.labels().id_for("Projects").as_deref(), Some("Label_9"));
    }

    #[tokio::test]
    async fn test_other_user_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/someone%40example.com/profile")
            .with_status(200)
            .with_body(r#"{"emailAddress": "someone@example.com"}"#)
            .create_async()
            .await;

        let svc = service(&server).for_user("someone@example.com");
        let profile = svc.get_profile().await.unwrap();

        mock.assert_async().await;
        assert_eq!(profile.email_address, "someone@example.com");
    }
}
