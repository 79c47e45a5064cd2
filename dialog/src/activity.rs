//! Inbound activities and outbound messages.

use serde::{Deserialize, Serialize};

/// Kind of an inbound activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    ConversationUpdate,
    Typing,
    #[serde(other)]
    Other,
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    #[serde(default)]
    pub content_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Attachment {
    pub fn new(content_type: impl Into<String>, content_url: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content_url: content_url.into(),
            name: None,
        }
    }
}

/// One inbound turn from a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub kind: ActivityType,
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Activity {
    /// Creates a text message.
    pub fn message(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: ActivityType::Message,
            conversation_id: conversation_id.into(),
            text: Some(text.into()),
            attachments: Vec::new(),
        }
    }

    /// Creates a message that carries one attachment and no text.
    pub fn attachment(conversation_id: impl Into<String>, attachment: Attachment) -> Self {
        Self {
            kind: ActivityType::Message,
            conversation_id: conversation_id.into(),
            text: None,
            attachments: vec![attachment],
        }
    }

    pub fn is_message(&self) -> bool {
        self.kind == ActivityType::Message
    }

    /// Returns the trimmed text, or an empty string.
    pub fn text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// A message sent back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outbound {
    pub text: String,
    /// Quick replies offered with the message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<String>,
}

impl Outbound {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggested_actions: Vec::new(),
        }
    }

    pub fn with_actions(text: impl Into<String>, actions: Vec<String>) -> Self {
        Self {
            text: text.into(),
            suggested_actions: actions,
        }
    }
}
