//! Gmail API integration
//!
//! This module provides:
//! - Gmail API client implementing [`crate::remote::MailClient`]
//! - Conversion of API payloads into part trees

mod client;
mod normalize;

pub use client::{GmailClient, GmailConnector};
pub use normalize::{into_part_tree, into_raw_message};

/// Gmail API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    pub use crate::models::Header;

    /// Response from listing messages
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub result_size_estimate: Option<u32>,
    }

    /// Listing entry; only the id is used
    #[derive(Debug, Deserialize)]
    pub struct MessageRef {
        pub id: String,
    }

    /// A message fetched with `format=full`
    #[derive(Debug, Deserialize)]
    pub struct GmailMessage {
        pub id: String,
        pub payload: Option<MessagePayload>,
    }

    /// Message payload containing headers and body
    ///
    /// The top-level payload has the same shape as any nested part.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePayload {
        pub headers: Option<Vec<Header>>,
        pub body: Option<PartBody>,
        pub parts: Option<Vec<MessagePayload>>,
        pub mime_type: Option<String>,
    }

    /// Inline part data, base64url encoded
    #[derive(Debug, Deserialize)]
    pub struct PartBody {
        pub data: Option<String>,
    }

    /// Response from the profile endpoint
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProfileResponse {
        pub email_address: String,
        pub messages_total: Option<u64>,
    }

    /// Body of a send request
    #[derive(Debug, Serialize)]
    pub struct SendMessageRequest<'a> {
        pub raw: &'a str,
    }

    /// The message resource returned by a send
    #[derive(Debug, Deserialize)]
    pub struct SendMessageResponse {
        pub id: String,
    }
}
