// Gmail v1 resource schemas

use super::mime::Email;
use crate::models::{
    LabelColorValue, LabelId, LabelListVisibility, LabelType, MessageListVisibility,
};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// URL-safe alphabet; Gmail omits padding on some bodies and includes it on others
pub(crate) const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

mod body_data {
    use super::URL_SAFE_LENIENT;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_LENIENT.encode(data.as_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let bytes = URL_SAFE_LENIENT
            .decode(encoded.trim())
            .map_err(|e| serde::de::Error::custom(format!("Invalid base64url body: {}", e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Body of a message part. `data` holds the decoded text; it is base64url on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default, with = "body_data", skip_serializing_if = "String::is_empty")]
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessagePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<MailMessageHeader>,
    #[serde(default)]
    pub body: MailMessageBody,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MailMessagePart>,
}

impl MailMessagePart {
    fn find_text(&self, mime_type: &str) -> Option<&str> {
        if self.mime_type.eq_ignore_ascii_case(mime_type) && !self.body.data.is_empty() {
            return Some(self.body.data.as_str());
        }
        self.parts.iter().find_map(|p| p.find_text(mime_type))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    /// Id of the draft this message was read through, empty for plain messages
    #[serde(skip)]
    pub draft_id: String,
    #[serde(default)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub payload: MailMessagePart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_estimate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MailMessage {
    /// Header value by name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// First text/plain body in the part tree, or the root body
    pub fn body_text(&self) -> &str {
        self.payload
            .find_text("text/plain")
            .unwrap_or(self.payload.body.data.as_str())
    }

    /// Rebuild this message with `extra` appended to its body
    pub fn update_email(&self, extra: &str) -> Email {
        let mut email = Email::new(
            self.header("To").unwrap_or_default(),
            self.header("From").unwrap_or_default(),
            self.header("Subject").unwrap_or_default(),
            format!("{}{}", self.body_text(), extra),
        );
        if let Some(cc) = self.header("Cc") {
            email = email.with_cc(cc);
        }
        email
    }

    pub(crate) fn with_draft_id(mut self, draft_id: &str) -> Self {
        self.draft_id = draft_id.to_string();
        self
    }
}

impl fmt::Display for MailMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mail Message Details:")?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Labels: {}", self.label_ids.join(", "))?;
        writeln!(f, "Thread ID: {}", self.thread_id.as_deref().unwrap_or(""))?;
        write!(f, "Content: {}", self.body_text())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailDraft {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MailMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailDraftList {
    #[serde(default)]
    pub drafts: Vec<MailDraft>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelColor {
    pub text_color: LabelColorValue,
    pub background_color: LabelColorValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailUserLabel {
    /// Assigned by the server; left empty when creating a label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<MessageListVisibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<LabelListVisibility>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub label_type: Option<LabelType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_unread: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_unread: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<LabelColor>,
}

impl MailUserLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailUserProfile {
    pub email_address: String,
    #[serde(default)]
    pub messages_total: u64,
    #[serde(default)]
    pub threads_total: u64,
    pub history_id: Option<String>,
}

/// Label name/id pairs from the most recent label listing
#[derive(Debug, Default)]
pub struct LabelCache {
    entries: RwLock<Vec<LabelId>>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, labels: &[MailUserLabel]) {
        let mut entries = self.entries.write();
        entries.clear();
        entries.extend(labels.iter().map(|l| LabelId {
            name: l.name.clone(),
            id: l.id.clone(),
        }));
    }

    pub fn insert(&self, label: &MailUserLabel) {
        let mut entries = self.entries.write();
        entries.retain(|e| e.id != label.id);
        entries.push(LabelId {
            name: label.name.clone(),
            id: label.id.clone(),
        });
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn id_for(&self, name: &str) -> Option<String> {
        self.entries
            .read()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.id.clone())
    }

    pub fn entries(&self) -> Vec<LabelId> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
