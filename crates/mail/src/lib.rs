//! Mail crate - Core of the Letterbox mail client
//!
//! This crate provides platform-independent mail functionality including:
//! - OAuth2 credential lifecycle (consent, persistence, refresh)
//! - Gmail API client behind the [`MailClient`] trait
//! - Message decoding for display and composition for sending
//! - Bounded inbox sync into a shared snapshot
//! - A single-threaded controller driven by commands
//!
//! This crate has no UI dependencies; the presentation layer talks to it
//! through [`Command`]s and [`SessionEvent`]s.

pub mod auth;
pub mod compose;
pub mod config;
pub mod controller;
pub mod decode;
pub mod error;
pub mod events;
pub mod gmail;
pub mod models;
pub mod remote;
pub mod sync;

pub use auth::{AuthorizationServer, CredentialState, CredentialStore, GoogleOAuth, Grant};
pub use compose::ComposeDraft;
pub use config::{Capabilities, ClientSecret, Settings};
pub use controller::{Command, Controller, RetryPolicy};
pub use error::{AuthError, ComposeError, DecodeError, RemoteError, ValidationError};
pub use events::{EventSink, Operation, SessionEvent};
pub use gmail::{GmailClient, GmailConnector};
pub use models::{
    Credential, MessageBody, MessageId, MessageSummary, Scope, ScopeSet, SenderIdentity,
};
pub use remote::{MailClient, MailConnector};
pub use sync::{SharedSnapshot, Snapshot, SyncStats};
