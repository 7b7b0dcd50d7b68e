//! Credential persistence and lifecycle
//!
//! `ensure` walks the lifecycle:
//!
//! ```text
//! NoCredential -> PendingConsent -> Authorized
//! Authorized -> Expired -> Refreshing -> Authorized
//!                                     -> NoCredential -> PendingConsent
//! PendingConsent -> NoCredential (consent failed, fatal for the session)
//! ```

use chrono::Utc;
use log::{debug, error, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::consent::ConsentTask;
use super::oauth::AuthorizationServer;
use crate::config::ClientSecret;
use crate::error::AuthError;
use crate::events::{EventSink, SessionEvent};
use crate::models::{Credential, ScopeSet};

/// Where the credential lifecycle currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    NoCredential,
    PendingConsent,
    Authorized,
    Expired,
    Refreshing,
}

/// How the credential returned by `ensure` was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Loaded from disk and still valid
    Stored,
    Refreshed,
    /// New consent; carries the account address when the profile lookup succeeded
    Fresh { address: Option<String> },
}

/// A credential that covers the required scopes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub credential: Credential,
    pub grant: Grant,
}

/// Looks up the account's primary address for a credential
pub trait ProfileLookup {
    fn primary_address(&self, credential: &Credential) -> anyhow::Result<String>;
}

impl<F> ProfileLookup for F
where
    F: Fn(&Credential) -> anyhow::Result<String>,
{
    fn primary_address(&self, credential: &Credential) -> anyhow::Result<String> {
        self(credential)
    }
}

/// Owns the persisted credential and its lifecycle
pub struct CredentialStore {
    token_path: PathBuf,
    client_secret_path: PathBuf,
    server: Arc<dyn AuthorizationServer>,
    events: EventSink,
    state: RwLock<CredentialState>,
    /// Held for the whole of `ensure`, so at most one refresh or consent is in flight
    ensure_lock: Mutex<()>,
}

impl CredentialStore {
    /// Create a store
    ///
    /// # Arguments
    /// * `token_path` - Where the credential is persisted
    /// * `client_secret_path` - Client secret used for consent and refresh
    /// * `server` - Provider authorization endpoints
    /// * `events` - Receives the welcome notification
    pub fn new(
        token_path: PathBuf,
        client_secret_path: PathBuf,
        server: Arc<dyn AuthorizationServer>,
        events: EventSink,
    ) -> Self {
        Self {
            token_path,
            client_secret_path,
            server,
            events,
            state: RwLock::new(CredentialState::NoCredential),
            ensure_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> CredentialState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: CredentialState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            debug!("Credential state {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    /// Load the persisted credential
    ///
    /// A file that cannot be read or parsed is deleted and treated as absent.
    pub fn load(&self) -> Option<Credential> {
        let content = match fs::read_to_string(&self.token_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Error loading {}: {}", self.token_path.display(), e);
                self.discard();
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!("Error loading {}: {}", self.token_path.display(), e);
                self.discard();
                None
            }
        }
    }

    /// Save the credential to disk
    pub fn persist(&self, credential: &Credential) -> Result<(), AuthError> {
        config::save_json_file(&self.token_path, credential).map_err(|e| AuthError::Persist {
            reason: format!("{e:#}"),
        })
    }

    fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.token_path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!("Could not delete {}: {}", self.token_path.display(), e);
        }
    }

    /// Return a credential covering `required`, refreshing or re-consenting as needed
    ///
    /// A fresh grant triggers one profile lookup and a single
    /// [`SessionEvent::Welcome`]. Refreshes never do.
    pub fn ensure(
        &self,
        required: &ScopeSet,
        profile: &dyn ProfileLookup,
    ) -> Result<Authorization, AuthError> {
        let _guard = self.ensure_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Re-read under the lock: a caller that waited here sees what the
        // previous holder refreshed instead of refreshing again.
        if let Some(credential) = self.load() {
            if credential.is_valid_for(required) {
                self.set_state(CredentialState::Authorized);
                return Ok(Authorization {
                    credential,
                    grant: Grant::Stored,
                });
            }

            if !credential.scopes.covers(required) {
                info!(
                    "Stored credential lacks scopes: {}",
                    credential.scopes.missing_from(required)
                );
            } else if credential.can_refresh() {
                self.set_state(CredentialState::Expired);
                match self.refresh(&credential, required) {
                    Ok(refreshed) => {
                        info!("Refreshed expired credentials");
                        self.persist_logged(&refreshed);
                        self.set_state(CredentialState::Authorized);
                        return Ok(Authorization {
                            credential: refreshed,
                            grant: Grant::Refreshed,
                        });
                    }
                    Err(e) => {
                        warn!("{}; falling back to consent", e);
                        self.set_state(CredentialState::NoCredential);
                    }
                }
            }
        }

        let credential = self.consent(required)?;
        self.persist_logged(&credential);
        self.set_state(CredentialState::Authorized);

        let address = self.welcome(&credential, profile);
        Ok(Authorization {
            credential,
            grant: Grant::Fresh { address },
        })
    }

    fn refresh(&self, credential: &Credential, required: &ScopeSet) -> Result<Credential, AuthError> {
        self.set_state(CredentialState::Refreshing);

        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::RefreshFailed {
                reason: "no refresh token".to_string(),
            })?;
        let client =
            ClientSecret::load(&self.client_secret_path).map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
            })?;

        let refreshed = self
            .server
            .refresh(&client, refresh_token)?
            .into_credential(&credential.scopes, Some(credential));

        if !refreshed.scopes.covers(required) {
            return Err(AuthError::RefreshFailed {
                reason: format!(
                    "refreshed token lacks scopes: {}",
                    refreshed.scopes.missing_from(required)
                ),
            });
        }
        Ok(refreshed)
    }

    fn consent(&self, required: &ScopeSet) -> Result<Credential, AuthError> {
        self.set_state(CredentialState::PendingConsent);

        let result = ClientSecret::load(&self.client_secret_path)
            .and_then(|client| ConsentTask::spawn(self.server.clone(), client, required.clone()))
            .and_then(ConsentTask::wait)
            .map(|grant| grant.into_credential(required, None))
            .and_then(|credential| {
                if credential.scopes.covers(required) {
                    Ok(credential)
                } else {
                    Err(AuthError::ConsentFailed {
                        reason: format!(
                            "required permissions were not granted: {}",
                            credential.scopes.missing_from(required)
                        ),
                    })
                }
            });

        if let Err(e) = &result {
            error!("{}", e);
            self.set_state(CredentialState::NoCredential);
        } else {
            info!("Successfully created new credentials");
        }
        result
    }

    fn persist_logged(&self, credential: &Credential) {
        match self.persist(credential) {
            Ok(()) => debug!("Saved credential to {}", self.token_path.display()),
            Err(e) => warn!("{}", e),
        }
    }

    fn welcome(&self, credential: &Credential, profile: &dyn ProfileLookup) -> Option<String> {
        match profile.primary_address(credential) {
            Ok(address) => {
                info!("Signed in as {}", address);
                self.events.emit(SessionEvent::Welcome {
                    address: address.clone(),
                });
                Some(address)
            }
            Err(e) => {
                warn!("Error getting user profile: {:#}", e);
                None
            }
        }
    }

    /// Mark the persisted credential as expired
    ///
    /// Used when the provider rejects the access token mid-session, so the
    /// next `ensure` refreshes or re-consents.
    pub fn expire(&self) {
        let _guard = self.ensure_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut credential) = self.load() {
            credential.expires_at = Some(Utc::now());
            self.persist_logged(&credential);
        }
        self.set_state(CredentialState::Expired);
    }

    /// Clear the stored credential (logout)
    pub fn logout(&self) -> Result<(), AuthError> {
        let _guard = self.ensure_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.token_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AuthError::Persist {
                    reason: format!("could not delete {}: {e}", self.token_path.display()),
                });
            }
        }
        self.set_state(CredentialState::NoCredential);
        Ok(())
    }
}
