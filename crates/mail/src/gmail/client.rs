//! Gmail API HTTP client
//!
//! Provides list/get/send/profile against the Gmail API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use log::debug;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::api::{
    GmailMessage, ListMessagesResponse, ProfileResponse, SendMessageRequest, SendMessageResponse,
};
use super::normalize::into_raw_message;
use crate::error::{AuthError, RemoteError};
use crate::models::{Credential, MessageId, MessageStub, RawMessage, ScopeSet, TransportPayload};
use crate::remote::{MailClient, MailConnector, require_scopes};

/// Gmail API client bound to one access token
pub struct GmailClient {
    agent: ureq::Agent,
    access_token: String,
    base_url: String,
}

impl GmailClient {
    /// Gmail API base URL for the authenticated user
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1/users/me";

    /// Largest page the list endpoint accepts
    const MAX_RESULTS: usize = 500;

    /// Create a client for `credential`, which must carry every scope in `required`
    pub fn new(
        credential: &Credential,
        required: &ScopeSet,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        Self::with_base_url(credential, required, timeout, Self::BASE_URL)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(
        credential: &Credential,
        required: &ScopeSet,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, AuthError> {
        require_scopes(credential, required)?;

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Ok(Self {
            agent,
            access_token: credential.access_token.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn list_url(&self, folder: &str, limit: usize) -> String {
        format!(
            "{}/messages?maxResults={}&labelIds={}",
            self.base_url,
            limit.min(Self::MAX_RESULTS),
            urlencoding::encode(folder)
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<T, RemoteError> {
        debug!("GET {}", url);
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", &self.bearer())
            .call()
            .map_err(|e| classify(e, context))?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| malformed(e, context))
    }
}

impl MailClient for GmailClient {
    fn list(&self, folder: &str, limit: usize) -> Result<Vec<MessageStub>, RemoteError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let list: ListMessagesResponse =
            self.get_json(&self.list_url(folder, limit), "list messages")?;
        debug!(
            "{} holds about {} messages",
            folder,
            list.result_size_estimate.unwrap_or(0)
        );

        Ok(list
            .messages
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(|m| MessageStub {
                id: MessageId::new(m.id),
            })
            .collect())
    }

    fn get(&self, id: &MessageId) -> Result<RawMessage, RemoteError> {
        let url = format!(
            "{}/messages/{}?format=full",
            self.base_url,
            urlencoding::encode(id.as_str())
        );
        let message: GmailMessage = self.get_json(&url, &format!("message {}", id))?;
        Ok(into_raw_message(message))
    }

    fn send(&self, payload: &TransportPayload) -> Result<MessageId, RemoteError> {
        let url = format!("{}/messages/send", self.base_url);
        debug!("POST {}", url);

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &self.bearer())
            .send_json(SendMessageRequest {
                raw: payload.as_str(),
            })
            .map_err(|e| classify(e, "send message"))?;

        let sent: SendMessageResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| malformed(e, "send message"))?;

        Ok(MessageId::new(sent.id))
    }

    fn profile(&self) -> Result<String, RemoteError> {
        let url = format!("{}/profile", self.base_url);
        let profile: ProfileResponse = self.get_json(&url, "profile")?;
        if let Some(total) = profile.messages_total {
            debug!("{} has {} messages", profile.email_address, total);
        }
        Ok(profile.email_address)
    }
}

/// Builds [`GmailClient`]s with a shared request timeout
#[derive(Debug, Clone)]
pub struct GmailConnector {
    timeout: Duration,
}

impl GmailConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl MailConnector for GmailConnector {
    type Client = GmailClient;

    fn connect(&self, credential: &Credential, required: &ScopeSet) -> Result<GmailClient, AuthError> {
        GmailClient::new(credential, required, self.timeout)
    }
}

/// Map a request failure onto the remote error taxonomy
fn classify(err: ureq::Error, context: &str) -> RemoteError {
    match err {
        ureq::Error::StatusCode(status) => RemoteError::from_status(status, context),
        other => RemoteError::Transient {
            message: format!("{context}: {other}"),
        },
    }
}

fn malformed(err: ureq::Error, context: &str) -> RemoteError {
    RemoteError::Transient {
        message: format!("{context}: malformed response: {err}"),
    }
}
