//! Message models: provider-side raw messages and display-ready summaries

use serde::{Deserialize, Serialize};

/// Literal shown when a message has no decodable text/plain content
pub const NO_TEXT_CONTENT: &str = "No text content available";

/// Unique identifier for a message (provider-assigned message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A listed message, before its content is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStub {
    pub id: MessageId,
}

/// Email header (name-value pair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// MIME structure of a message body
///
/// Only exists while a message is being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    /// A part carrying content; `data` is base64url when present
    Leaf {
        mime_type: String,
        data: Option<String>,
    },
    /// A multipart container with ordered children
    Multipart {
        mime_type: String,
        children: Vec<MessagePart>,
    },
}

impl MessagePart {
    pub fn mime_type(&self) -> &str {
        match self {
            MessagePart::Leaf { mime_type, .. } | MessagePart::Multipart { mime_type, .. } => {
                mime_type
            }
        }
    }
}

/// A fetched message: headers plus its part tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: MessageId,
    pub headers: Vec<Header>,
    pub payload: Option<MessagePart>,
}

/// One row of the inbox view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: MessageId,
    pub sender: String,
    pub subject: String,
    /// `YYYY-MM-DD HH:MM`, or `Invalid Date`
    pub date: String,
}

/// Decoded body text of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    NoTextContent,
}

impl MessageBody {
    /// Text to display, substituting the fallback literal
    pub fn as_display(&self) -> &str {
        match self {
            MessageBody::Text(text) => text,
            MessageBody::NoTextContent => NO_TEXT_CONTENT,
        }
    }
}
