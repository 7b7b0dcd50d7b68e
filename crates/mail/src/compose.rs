//! Outgoing message construction
//!
//! Validation happens in [`build`] before anything touches the network;
//! [`serialize`] produces the base64url RFC 822 payload the provider expects.

use base64::prelude::*;
use mail_builder::MessageBuilder;

use crate::error::{ComposeError, ValidationError};
use crate::models::{OutboundMessage, SenderIdentity, TransportPayload};

/// Fields of the compose form, as entered
///
/// Owned by the presentation layer until dispatched; dropping it cancels the
/// send with no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposeDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Empty or `me` sends as the authenticated account
    pub from: String,
}

impl ComposeDraft {
    pub fn build(&self) -> Result<OutboundMessage, ValidationError> {
        build(
            &self.to,
            &self.subject,
            &self.body,
            SenderIdentity::parse(&self.from),
        )
    }
}

/// Validate the entered fields and assemble an outbound message
pub fn build(
    recipient: &str,
    subject: &str,
    body: &str,
    sender: SenderIdentity,
) -> Result<OutboundMessage, ValidationError> {
    for (field, value) in [("recipient", recipient), ("subject", subject), ("body", body)] {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField { field });
        }
    }

    Ok(OutboundMessage {
        to: recipient.trim().to_string(),
        subject: subject.trim().to_string(),
        body: body.to_string(),
        from: sender,
    })
}

/// Serialize to RFC 822 and encode as unpadded base64url
pub fn serialize(message: &OutboundMessage) -> Result<TransportPayload, ComposeError> {
    let mut builder = MessageBuilder::new()
        .to(message.to.as_str())
        .subject(message.subject.as_str())
        .text_body(message.body.as_str());

    // Without a From header the provider uses the account address
    if let SenderIdentity::Address(address) = &message.from {
        builder = builder.from(address.as_str());
    }

    let bytes = builder.write_to_vec()?;
    Ok(TransportPayload(BASE64_URL_SAFE_NO_PAD.encode(bytes)))
}

/// The greeting sent to a newly authorized account
pub fn welcome_message(address: &str) -> Result<OutboundMessage, ValidationError> {
    build(
        address,
        "Welcome to Letterbox!",
        "Thank you for signing up! We're excited to have you on board.\n\n\
         Here are a few things you can do to get started:\n\
         - Refresh your inbox to see your latest messages\n\
         - Open a message to read it\n\
         - Compose a new email\n",
        SenderIdentity::Address(address.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::extract_body;
    use crate::models::{MessageBody, MessagePart};
    use mailparse::MailHeaderMap;

    fn parse(payload: &TransportPayload) -> Vec<u8> {
        BASE64_URL_SAFE_NO_PAD.decode(payload.as_str()).unwrap()
    }

    #[test]
    fn test_empty_recipient_rejected() {
        let err = build("", "Subject", "Body", SenderIdentity::Me).unwrap_err();
        assert_eq!(err, ValidationError::EmptyField { field: "recipient" });
    }

    #[test]
    fn test_whitespace_only_fields_rejected() {
        assert_eq!(
            build("bob@example.com", "   ", "Body", SenderIdentity::Me),
            Err(ValidationError::EmptyField { field: "subject" })
        );
        assert_eq!(
            build("bob@example.com", "Hi", "\n\t ", SenderIdentity::Me),
            Err(ValidationError::EmptyField { field: "body" })
        );
    }

    #[test]
    fn test_build_trims_addressing_keeps_body() {
        let msg = build(" bob@example.com ", " Hi ", "  indented\n", SenderIdentity::Me).unwrap();
        assert_eq!(msg.to, "bob@example.com");
        assert_eq!(msg.subject, "Hi");
        assert_eq!(msg.body, "  indented\n");
    }

    #[test]
    fn test_serialize_headers_and_body() {
        let msg = build(
            "bob@example.com",
            "Lunch tomorrow?",
            "Noon at the usual place.",
            SenderIdentity::Address("alice@example.com".into()),
        )
        .unwrap();
        let bytes = parse(&serialize(&msg).unwrap());
        let mail = mailparse::parse_mail(&bytes).unwrap();

        assert_eq!(
            mail.headers.get_first_value("Subject").as_deref(),
            Some("Lunch tomorrow?")
        );
        assert!(mail.headers.get_first_value("To").unwrap().contains("bob@example.com"));
        assert!(mail.headers.get_first_value("From").unwrap().contains("alice@example.com"));
        assert_eq!(mail.get_body().unwrap().trim_end(), "Noon at the usual place.");
    }

    #[test]
    fn test_implicit_sender_omits_from() {
        let msg = build("bob@example.com", "Hi", "Body", SenderIdentity::Me).unwrap();
        let bytes = parse(&serialize(&msg).unwrap());
        let mail = mailparse::parse_mail(&bytes).unwrap();
        assert!(mail.headers.get_first_value("From").is_none());
    }

    #[test]
    fn test_serialized_payload_is_url_safe() {
        let msg = build("bob@example.com", "Hi", &"?>~".repeat(50), SenderIdentity::Me).unwrap();
        let payload = serialize(&msg).unwrap();
        assert!(!payload.as_str().contains(['+', '/', '=']));
    }

    #[test]
    fn test_non_ascii_body_survives_serialization() {
        let body = "Grüße aus Köln ☕";
        let msg = build("bob@example.com", "Café", body, SenderIdentity::Me).unwrap();
        let bytes = parse(&serialize(&msg).unwrap());
        let mail = mailparse::parse_mail(&bytes).unwrap();

        assert_eq!(mail.headers.get_first_value("Subject").as_deref(), Some("Café"));
        assert_eq!(mail.get_body().unwrap().trim_end(), body);
    }

    /// The part tree a provider reports for a delivered payload
    fn delivered_part_tree(payload: &TransportPayload) -> MessagePart {
        let bytes = parse(payload);
        let mail = mailparse::parse_mail(&bytes).unwrap();
        MessagePart::Leaf {
            mime_type: mail.ctype.mimetype.clone(),
            data: Some(BASE64_URL_SAFE_NO_PAD.encode(mail.get_body_raw().unwrap())),
        }
    }

    #[test]
    fn test_round_trip_through_serialization() {
        for body in ["Hello", "Line one\nLine two\n", "Unicode: żółć ✓"] {
            let msg = build("bob@example.com", "Subject", body, SenderIdentity::Me).unwrap();
            let tree = delivered_part_tree(&serialize(&msg).unwrap());
            assert_eq!(
                extract_body(&tree).unwrap(),
                MessageBody::Text(body.to_string()),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn test_draft_build() {
        let draft = ComposeDraft {
            to: "bob@example.com".into(),
            subject: "Hi".into(),
            body: "Body".into(),
            from: "me".into(),
        };
        assert_eq!(draft.build().unwrap().from, SenderIdentity::Me);
        assert!(ComposeDraft::default().build().is_err());
    }

    #[test]
    fn test_welcome_message_addresses_account() {
        let msg = welcome_message("me@example.com").unwrap();
        assert_eq!(msg.to, "me@example.com");
        assert_eq!(msg.from, SenderIdentity::Address("me@example.com".into()));
    }
}
