//! Remote mail API boundary
//!
//! These traits abstract over the provider so the controller and sync engine
//! can be exercised without a network.

use crate::error::{AuthError, RemoteError};
use crate::models::{Credential, MessageId, MessageStub, RawMessage, ScopeSet, TransportPayload};

/// Operations against the provider's mail API
///
/// Implementations classify failures but never retry; retrying is the
/// caller's decision.
pub trait MailClient: Send + Sync {
    /// List up to `limit` message stubs in `folder`, in provider order
    fn list(&self, folder: &str, limit: usize) -> Result<Vec<MessageStub>, RemoteError>;

    /// Fetch headers and part tree of a message
    fn get(&self, id: &MessageId) -> Result<RawMessage, RemoteError>;

    /// Submit a serialized message, returning the id the provider assigned
    fn send(&self, payload: &TransportPayload) -> Result<MessageId, RemoteError>;

    /// Primary address of the authenticated account
    fn profile(&self) -> Result<String, RemoteError>;
}

/// Builds a [`MailClient`] from a credential
pub trait MailConnector: Send + Sync {
    type Client: MailClient;

    /// Construct a client; the credential must carry every scope in `required`
    fn connect(&self, credential: &Credential, required: &ScopeSet) -> Result<Self::Client, AuthError>;
}

/// Check the scope invariant shared by every connector
pub fn require_scopes(credential: &Credential, required: &ScopeSet) -> Result<(), AuthError> {
    if credential.scopes.covers(required) {
        Ok(())
    } else {
        Err(AuthError::MissingScopes {
            missing: credential.scopes.missing_from(required),
        })
    }
}
