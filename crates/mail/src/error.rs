//! Error taxonomy for the mail core
//!
//! Each layer returns its own error type so callers can apply the
//! propagation policy without string matching:
//! - [`AuthError`]: credential acquisition; `MissingConfig`, `ConsentFailed`
//!   and `MissingScopes` end the session
//! - [`RemoteError`]: provider calls; `Permanent` forces re-authentication
//! - [`DecodeError`]: isolated to a single message
//! - [`ValidationError`]: blocks only the send action

use std::path::PathBuf;

use crate::models::ScopeSet;

/// Credential lifecycle failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("client secret configuration not found at {}", path.display())]
    MissingConfig { path: PathBuf },

    #[error("authorization failed: {reason}")]
    ConsentFailed { reason: String },

    #[error("token refresh failed: {reason}")]
    RefreshFailed { reason: String },

    #[error("credential is missing required scopes: {missing}")]
    MissingScopes { missing: ScopeSet },

    #[error("failed to save credential: {reason}")]
    Persist { reason: String },
}

impl AuthError {
    /// Whether the session cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AuthError::MissingConfig { .. }
                | AuthError::ConsentFailed { .. }
                | AuthError::MissingScopes { .. }
        )
    }
}

/// Failures of a remote mail API call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Rate limiting, server errors, or network trouble
    #[error("temporary failure: {message}")]
    Transient { message: String },

    /// The credential was rejected (expired or revoked mid-session)
    #[error("authorization rejected: {message}")]
    Permanent { message: String },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other client error; retrying the same request will not help
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl RemoteError {
    /// Classify an HTTP status code returned by the provider
    pub fn from_status(status: u16, context: &str) -> Self {
        match status {
            401 | 403 => RemoteError::Permanent {
                message: format!("{context} returned {status}"),
            },
            404 => RemoteError::NotFound {
                resource: context.to_string(),
            },
            408 | 429 | 500..=599 => RemoteError::Transient {
                message: format!("{context} returned {status}"),
            },
            _ => RemoteError::Rejected {
                status,
                message: context.to_string(),
            },
        }
    }

    /// Candidate for caller-side retry with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transient { .. })
    }

    /// Must be handled by refreshing or re-consenting the credential
    pub fn requires_reauth(&self) -> bool {
        matches!(self, RemoteError::Permanent { .. })
    }
}

/// Failures turning a provider part tree into display text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("message has no part tree")]
    MalformedPartTree,

    #[error("body data is not valid base64url")]
    BadEncoding,
}

/// Compose form validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// Failure to serialize an outbound message
#[derive(Debug, thiserror::Error)]
#[error("failed to serialize message: {0}")]
pub struct ComposeError(#[from] std::io::Error);
