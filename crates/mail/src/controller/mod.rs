//! Session controller
//!
//! Serializes every user-initiated operation on one thread. Commands arrive
//! over a channel; results go out as [`SessionEvent`]s and through the shared
//! [`SharedSnapshot`].

mod handler;
mod retry;

pub use retry::RetryPolicy;

use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::auth::{CredentialState, CredentialStore, Grant};
use crate::compose::ComposeDraft;
use crate::config::Settings;
use crate::error::AuthError;
use crate::events::{EventSink, SessionEvent};
use crate::models::{Credential, MessageId, ScopeSet};
use crate::remote::{MailClient, MailConnector};
use crate::sync::SharedSnapshot;

/// A user-initiated operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Obtain a credential and connect, consenting if needed
    Authorize,
    /// Sync the recent window and replace the snapshot
    Refresh,
    Open(MessageId),
    Send(ComposeDraft),
    Logout,
    Shutdown,
}

/// Drives the credential store and mail client on behalf of the presentation layer
pub struct Controller<C: MailConnector> {
    store: CredentialStore,
    connector: C,
    settings: Settings,
    required: ScopeSet,
    retry: RetryPolicy,
    client: Option<C::Client>,
    snapshot: SharedSnapshot,
    events: EventSink,
    running: bool,
}

impl<C: MailConnector> Controller<C> {
    pub fn new(store: CredentialStore, connector: C, settings: Settings, events: EventSink) -> Self {
        let required = settings.capabilities.required_scopes();
        let retry = RetryPolicy::from(settings.retry);
        Self {
            store,
            connector,
            settings,
            required,
            retry,
            client: None,
            snapshot: SharedSnapshot::new(),
            events,
            running: true,
        }
    }

    /// Handle on the snapshot for display reads
    pub fn snapshot(&self) -> SharedSnapshot {
        self.snapshot.clone()
    }

    pub fn credential_state(&self) -> CredentialState {
        self.store.state()
    }

    /// Process one command; returns `false` once the session has ended
    pub fn handle(&mut self, command: Command) -> bool {
        debug!("Handling {:?}", command);
        match command {
            Command::Authorize => {
                self.authorize();
            }
            Command::Refresh => self.refresh(),
            Command::Open(id) => self.open(id),
            Command::Send(draft) => self.send(draft),
            Command::Logout => self.logout(),
            Command::Shutdown => {
                info!("Shutting down");
                self.running = false;
            }
        }
        self.running
    }

    /// Process commands until shutdown, a fatal error, or the sender hangs up
    pub fn run(mut self, commands: Receiver<Command>) {
        for command in commands {
            if !self.handle(command) {
                break;
            }
        }
        debug!("Controller loop finished");
    }

    /// Run the controller on its own thread
    pub fn spawn(self) -> std::io::Result<(Sender<Command>, JoinHandle<()>)>
    where
        C: 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("controller".to_string())
            .spawn(move || self.run(rx))?;
        Ok((tx, handle))
    }

    /// Ensure a credential and connect a client
    ///
    /// Emits `Authorized` on success. A fatal error ends the session.
    fn authorize(&mut self) -> bool {
        match self.connect() {
            Ok(grant) => {
                self.events.emit(SessionEvent::Authorized { grant });
                true
            }
            Err(e) if e.is_fatal() => {
                error!("{}", e);
                self.events.emit(SessionEvent::Fatal { error: e });
                self.running = false;
                false
            }
            Err(e) => {
                warn!("{}", e);
                self.events.emit(SessionEvent::AuthFailed { error: e });
                false
            }
        }
    }

    fn connect(&mut self) -> Result<Grant, AuthError> {
        self.client = None;

        let connector = &self.connector;
        let required = &self.required;
        let lookup = |credential: &Credential| -> anyhow::Result<String> {
            Ok(connector.connect(credential, required)?.profile()?)
        };
        let authorization = self.store.ensure(required, &lookup)?;
        let client = self.connector.connect(&authorization.credential, required)?;

        if let Grant::Fresh {
            address: Some(address),
        } = &authorization.grant
            && self.settings.capabilities.welcome_email
        {
            handler::send_welcome(&client, address, &self.events);
        }

        self.client = Some(client);
        Ok(authorization.grant)
    }

    fn logout(&mut self) {
        self.client = None;
        match self.store.logout() {
            Ok(()) => {
                info!("Signed out");
                self.snapshot.clear();
                self.events.emit(SessionEvent::LoggedOut);
            }
            Err(e) => {
                warn!("{}", e);
                self.events.emit(SessionEvent::AuthFailed { error: e });
            }
        }
    }
}
