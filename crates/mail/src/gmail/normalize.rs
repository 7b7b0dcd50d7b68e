//! Gmail API response normalization
//!
//! Converts Gmail API payloads into the provider-independent part tree.

use super::api::{GmailMessage, MessagePayload};
use crate::models::{MessageId, MessagePart, RawMessage};

/// Normalize a Gmail API message into headers plus part tree
pub fn into_raw_message(gmail_msg: GmailMessage) -> RawMessage {
    let id = MessageId::new(gmail_msg.id);
    match gmail_msg.payload {
        Some(mut payload) => RawMessage {
            id,
            headers: payload.headers.take().unwrap_or_default(),
            payload: Some(into_part_tree(payload)),
        },
        None => RawMessage {
            id,
            headers: Vec::new(),
            payload: None,
        },
    }
}

/// Convert a payload into a part tree
///
/// A payload with a non-empty `parts` array is a multipart node; anything
/// else is a leaf carrying its inline body data, if any.
pub fn into_part_tree(payload: MessagePayload) -> MessagePart {
    let mime_type = payload.mime_type.unwrap_or_default();
    match payload.parts {
        Some(parts) if !parts.is_empty() => MessagePart::Multipart {
            mime_type,
            children: parts.into_iter().map(into_part_tree).collect(),
        },
        _ => MessagePart::Leaf {
            mime_type,
            data: payload.body.and_then(|body| body.data),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Header;

    #[test]
    fn test_single_part_message() {
        let json = r#"{
            "id": "18f2a",
            "threadId": "18f2a",
            "payload": {
                "mimeType": "text/plain",
                "headers": [{"name": "Subject", "value": "Hi"}],
                "body": {"size": 5, "data": "aGVsbG8"}
            }
        }"#;
        let msg: GmailMessage = serde_json::from_str(json).unwrap();
        let raw = into_raw_message(msg);

        assert_eq!(raw.id.as_str(), "18f2a");
        assert_eq!(raw.headers, vec![Header::new("Subject", "Hi")]);
        assert_eq!(
            raw.payload,
            Some(MessagePart::Leaf {
                mime_type: "text/plain".into(),
                data: Some("aGVsbG8".into()),
            })
        );
    }

    #[test]
    fn test_multipart_message_keeps_child_order() {
        let json = r#"{
            "id": "m1",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [],
                "body": {"size": 0},
                "parts": [
                    {"partId": "0", "mimeType": "text/html", "body": {"data": "PGI-"}},
                    {"partId": "1", "mimeType": "text/plain", "body": {"data": "aGk"}}
                ]
            }
        }"#;
        let msg: GmailMessage = serde_json::from_str(json).unwrap();
        let raw = into_raw_message(msg);

        match raw.payload {
            Some(MessagePart::Multipart { mime_type, children }) => {
                assert_eq!(mime_type, "multipart/alternative");
                let types: Vec<&str> = children.iter().map(MessagePart::mime_type).collect();
                assert_eq!(types, vec!["text/html", "text/plain"]);
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_payload() {
        let msg: GmailMessage = serde_json::from_str(r#"{"id": "m2"}"#).unwrap();
        let raw = into_raw_message(msg);
        assert!(raw.headers.is_empty());
        assert!(raw.payload.is_none());
    }

    #[test]
    fn test_empty_parts_is_leaf() {
        let payload: MessagePayload =
            serde_json::from_str(r#"{"mimeType": "text/plain", "parts": []}"#).unwrap();
        assert_eq!(
            into_part_tree(payload),
            MessagePart::Leaf {
                mime_type: "text/plain".into(),
                data: None
            }
        );
    }
}
