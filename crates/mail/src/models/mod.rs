//! Domain models for mail entities

mod credential;
mod message;
mod outbound;

pub use credential::{Credential, Scope, ScopeSet};
pub use message::{
    Header, MessageBody, MessageId, MessagePart, MessageStub, MessageSummary, RawMessage,
    NO_TEXT_CONTENT,
};
pub use outbound::{OutboundMessage, SenderIdentity, TransportPayload};
