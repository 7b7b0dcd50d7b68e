//! Per-command handlers
//!
//! Every remote call goes through [`Controller::with_client`], which connects
//! on demand and re-authorizes once when the provider rejects the credential.

use log::{info, warn};

use super::Controller;
use crate::compose::{self, ComposeDraft};
use crate::decode::{extract_message_body, summarize};
use crate::error::RemoteError;
use crate::events::{EventSink, Operation, SessionEvent};
use crate::models::{MessageBody, MessageId};
use crate::remote::{MailClient, MailConnector};
use crate::sync::sync_inbox;

impl<C: MailConnector> Controller<C> {
    pub(super) fn refresh(&mut self) {
        let folder = self.settings.folder.clone();
        let limit = self.settings.fetch_limit;

        let Some(sync) = self.with_client(Operation::Sync, |client| {
            sync_inbox(client, &folder, limit)
        }) else {
            return;
        };

        if sync.stats.messages_listed == 0 {
            info!("No messages in {}", folder);
            self.snapshot.replace(Vec::new());
            self.events.emit(SessionEvent::NoMessages);
            return;
        }

        let count = sync.summaries.len();
        self.snapshot.replace(sync.summaries);
        self.events.emit(SessionEvent::SnapshotReplaced { count });
    }

    pub(super) fn open(&mut self, id: MessageId) {
        let Some(raw) = self.with_client(Operation::Open, |client| client.get(&id)) else {
            return;
        };

        let body = extract_message_body(&raw).unwrap_or_else(|e| {
            warn!("Could not decode message {}: {}", id, e);
            MessageBody::NoTextContent
        });
        let summary = summarize(id, &raw.headers);
        self.events.emit(SessionEvent::MessageOpened { summary, body });
    }

    pub(super) fn send(&mut self, draft: ComposeDraft) {
        if !self.settings.capabilities.send {
            warn!("Send requested but sending is disabled");
            self.events.emit(SessionEvent::Disabled {
                operation: Operation::Send,
            });
            return;
        }

        let message = match draft.build() {
            Ok(message) => message,
            Err(error) => {
                info!("Draft rejected: {}", error);
                self.events.emit(SessionEvent::SendRejected { draft, error });
                return;
            }
        };

        let payload = match compose::serialize(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("{}", e);
                self.events.emit(SessionEvent::ComposeFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };

        if let Some(id) = self.with_client(Operation::Send, |client| client.send(&payload)) {
            info!("Message sent: {}", id);
            self.events.emit(SessionEvent::Sent { id });
        }
    }

    /// Run `op` against the connected client
    ///
    /// Transient failures follow the retry policy. A permanent failure emits
    /// `ReauthRequired`, expires the credential and tries once more with a
    /// fresh client. Any remaining failure is emitted as `OperationFailed`.
    fn with_client<T>(
        &mut self,
        operation: Operation,
        op: impl Fn(&C::Client) -> Result<T, RemoteError>,
    ) -> Option<T> {
        if self.client.is_none() && !self.authorize() {
            return None;
        }

        let mut result = self.attempt(&op)?;

        if let Err(e) = &result
            && e.requires_reauth()
        {
            warn!("Credential rejected during {:?}: {}", operation, e);
            self.events.emit(SessionEvent::ReauthRequired);
            self.store.expire();
            if !self.authorize() {
                return None;
            }
            result = self.attempt(&op)?;
        }

        match result {
            Ok(value) => Some(value),
            Err(error) => {
                warn!("{:?} failed: {}", operation, error);
                self.events
                    .emit(SessionEvent::OperationFailed { operation, error });
                None
            }
        }
    }

    fn attempt<T>(
        &self,
        op: &impl Fn(&C::Client) -> Result<T, RemoteError>,
    ) -> Option<Result<T, RemoteError>> {
        let client = self.client.as_ref()?;
        Some(self.retry.run(|| op(client)))
    }
}

/// Send the greeting to a newly authorized account
///
/// The outcome is reported as an event; the session carries on either way.
pub(super) fn send_welcome(client: &impl MailClient, address: &str, events: &EventSink) {
    let sent = compose::welcome_message(address)
        .map_err(|e| e.to_string())
        .and_then(|message| compose::serialize(&message).map_err(|e| e.to_string()))
        .and_then(|payload| client.send(&payload).map_err(|e| e.to_string()));

    match sent {
        Ok(id) => {
            info!("Welcome email sent to {} ({})", address, id);
            events.emit(SessionEvent::WelcomeEmailSent {
                address: address.to_string(),
            });
        }
        Err(reason) => {
            warn!("Failed to send welcome email: {}", reason);
            events.emit(SessionEvent::WelcomeEmailFailed { reason });
        }
    }
}
