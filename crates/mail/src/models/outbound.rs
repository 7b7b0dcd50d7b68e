//! Outgoing message model

/// Who the message is sent as
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SenderIdentity {
    /// The authenticated account; the provider fills in the From header
    #[default]
    Me,
    Address(String),
}

impl SenderIdentity {
    /// Interpret user input: empty or `me` means the implicit account identity
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("me") {
            SenderIdentity::Me
        } else {
            SenderIdentity::Address(input.to_string())
        }
    }
}

/// A validated message ready to be serialized and sent
///
/// Constructed fresh per send attempt and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub from: SenderIdentity,
}

/// Base64url-encoded RFC 822 message, as submitted to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPayload(pub String);

impl TransportPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
