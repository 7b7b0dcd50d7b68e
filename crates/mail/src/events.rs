//! Events delivered from the core to the presentation layer

use log::debug;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::auth::Grant;
use crate::compose::ComposeDraft;
use crate::error::{AuthError, RemoteError, ValidationError};
use crate::models::{MessageBody, MessageId, MessageSummary};

/// The operation a remote failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Sync,
    Open,
    Send,
}

impl Operation {
    fn describe(self) -> &'static str {
        match self {
            Operation::Sync => "fetch emails",
            Operation::Open => "fetch email content",
            Operation::Send => "send email",
        }
    }
}

/// Something the presentation layer should render
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Authorized { grant: Grant },
    /// One-shot greeting after a fresh grant
    Welcome { address: String },
    WelcomeEmailSent { address: String },
    /// The greeting could not be built or sent; authorization still proceeds
    WelcomeEmailFailed { reason: String },
    /// The shared snapshot now holds `count` summaries
    SnapshotReplaced { count: usize },
    /// The mailbox listing came back empty (not an error)
    NoMessages,
    /// Summary is built from the fetched headers
    MessageOpened { summary: MessageSummary, body: MessageBody },
    Sent { id: MessageId },
    /// Validation failed; the draft is handed back untouched
    SendRejected { draft: ComposeDraft, error: ValidationError },
    OperationFailed { operation: Operation, error: RemoteError },
    /// The operation is turned off in the settings
    Disabled { operation: Operation },
    ComposeFailed { reason: String },
    ReauthRequired,
    /// Authorization failed but a later command may try again
    AuthFailed { error: AuthError },
    LoggedOut,
    /// The session cannot continue
    Fatal { error: AuthError },
}

impl SessionEvent {
    /// Text for a user-visible notice, if this event warrants one
    pub fn user_message(&self) -> Option<String> {
        match self {
            SessionEvent::Welcome { address } => Some(format!("Signed in as {address}")),
            SessionEvent::WelcomeEmailSent { address } => {
                Some(format!("Welcome email sent to {address}"))
            }
            SessionEvent::WelcomeEmailFailed { reason } => {
                Some(format!("Failed to send welcome email: {reason}"))
            }
            SessionEvent::NoMessages => Some("No emails found in the inbox.".to_string()),
            SessionEvent::Sent { id } => Some(format!("Email sent (id {id})")),
            SessionEvent::SendRejected { error, .. } => Some(format!("Cannot send: {error}")),
            SessionEvent::OperationFailed { operation, error } => {
                Some(format!("Failed to {}: {error}", operation.describe()))
            }
            SessionEvent::Disabled { operation } => {
                Some(format!("Cannot {}: disabled in settings", operation.describe()))
            }
            SessionEvent::ComposeFailed { reason } => {
                Some(format!("Failed to prepare email: {reason}"))
            }
            SessionEvent::AuthFailed { error } => Some(format!("Authentication error: {error}")),
            SessionEvent::LoggedOut => Some("Signed out.".to_string()),
            SessionEvent::ReauthRequired => {
                Some("Your session expired, signing in again...".to_string())
            }
            SessionEvent::Fatal { error } => Some(match error {
                AuthError::MissingConfig { path } => format!(
                    "{} not found at {}\n\nPlease ensure the file exists and has proper permissions.",
                    crate::config::CLIENT_SECRET_FILE,
                    path.display()
                ),
                other => format!("Authentication error: {other}"),
            }),
            SessionEvent::Authorized { .. }
            | SessionEvent::SnapshotReplaced { .. }
            | SessionEvent::MessageOpened { .. } => None,
        }
    }
}

/// Sending half of the event channel
///
/// A presentation layer that has gone away is not an error for the core.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<SessionEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the presentation layer reads from
    pub fn channel() -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: SessionEvent) {
        if let Err(mpsc::SendError(event)) = self.tx.send(event) {
            debug!("Dropping event, receiver closed: {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_emit_after_receiver_dropped_is_silent() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(SessionEvent::NoMessages);
    }

    #[test]
    fn test_fatal_missing_config_message_names_path() {
        let event = SessionEvent::Fatal {
            error: AuthError::MissingConfig {
                path: PathBuf::from("/apps/letterbox/credentials.json"),
            },
        };
        let message = event.user_message().unwrap();
        assert!(message.contains("/apps/letterbox/credentials.json"));
    }

    #[test]
    fn test_welcome_email_outcome_messages() {
        let sent = SessionEvent::WelcomeEmailSent {
            address: "me@example.com".into(),
        };
        assert_eq!(
            sent.user_message().as_deref(),
            Some("Welcome email sent to me@example.com")
        );

        let failed = SessionEvent::WelcomeEmailFailed {
            reason: "quota exceeded".into(),
        };
        assert_eq!(
            failed.user_message().as_deref(),
            Some("Failed to send welcome email: quota exceeded")
        );
    }

    #[test]
    fn test_snapshot_events_are_silent() {
        assert!(SessionEvent::SnapshotReplaced { count: 3 }.user_message().is_none());
    }
}
