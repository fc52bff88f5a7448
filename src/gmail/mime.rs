// Outgoing RFC 2822 message builder

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    to: Vec<String>,
    from: String,
    subject: String,
    body: String,
    html: Option<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
}

impl Email {
    pub fn new(
        to: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: vec![to.into()],
            from: from.into(),
            subject: subject.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn add_to(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc.push(cc.into());
        self
    }

    pub fn with_bcc(mut self, bcc: impl Into<String>) -> Self {
        self.bcc.push(bcc.into());
        self
    }

    /// Send `html` as a multipart/alternative sibling of the plain body
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn to_mime(&self) -> String {
        let mut message = String::new();
        push_address_header(&mut message, "To", &self.to);
        if !self.from.is_empty() {
            message.push_str(&format!("From: {}\r\n", single_line(&self.from)));
        }
        push_address_header(&mut message, "Cc", &self.cc);
        push_address_header(&mut message, "Bcc", &self.bcc);
        message.push_str(&format!("Subject: {}\r\n", encode_header(&single_line(&self.subject))));
        message.push_str("MIME-Version: 1.0\r\n");

        match &self.html {
            None => {
                message.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
                message.push_str(&self.body);
            }
            Some(html) => {
                let boundary = format!("----=_Alt_{}", uuid::Uuid::new_v4().simple());
                message.push_str(&format!(
                    "Content-Type: multipart/alternative; boundary=\"{}\"\r\n\r\n",
                    boundary
                ));

                message.push_str(&format!("--{}\r\n", boundary));
                message.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
                message.push_str(&self.body);
                message.push_str("\r\n");

                message.push_str(&format!("--{}\r\n", boundary));
                message.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
                message.push_str(html);
                message.push_str("\r\n");

                message.push_str(&format!("--{}--\r\n", boundary));
            }
        }

        message
    }

    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.to_mime().as_bytes())
    }

    /// Envelope for drafts.create / drafts.update
    pub fn prepared(&self) -> Value {
        json!({ "message": { "raw": self.to_base64() } })
    }

    /// Envelope for messages.send
    pub fn raw_message(&self) -> Value {
        json!({ "raw": self.to_base64() })
    }
}

fn push_address_header(message: &mut String, name: &str, addresses: &[String]) {
    let addresses: Vec<String> = addresses
        .iter()
        .map(|a| single_line(a.trim()))
        .filter(|a| !a.is_empty())
        .collect();
    if !addresses.is_empty() {
        message.push_str(&format!("{}: {}\r\n", name, addresses.join(", ")));
    }
}

/// Header values may not carry line breaks; each CR or LF becomes a space
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// RFC 2047 encoded-word for non-ASCII header values
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}
