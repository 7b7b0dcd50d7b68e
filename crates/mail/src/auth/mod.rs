//! OAuth2 credential lifecycle
//!
//! This module provides:
//! - Credential persistence with corrupt-file recovery
//! - Refresh and interactive consent against Google's endpoints
//! - The consent flow as a background task with a single result

mod consent;
mod oauth;
mod store;

pub use consent::ConsentTask;
pub use oauth::{AuthorizationServer, GoogleOAuth, TokenGrant};
pub use store::{Authorization, CredentialState, CredentialStore, Grant, ProfileLookup};
