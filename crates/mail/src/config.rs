//! Configuration loading for the mail core
//!
//! Two files are involved:
//! 1. The client secret (Google Cloud Console JSON, `installed` or `web`
//!    section), which identifies the application when starting consent.
//!    It lives next to the executable by default.
//! 2. Optional user settings (`~/.config/letterbox/settings.json`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AuthError;
use crate::models::{Scope, ScopeSet};

/// Client secret filename next to the executable
pub const CLIENT_SECRET_FILE: &str = "credentials.json";

/// Persisted credential filename next to the executable
pub const TOKEN_FILE: &str = "token.json";

/// Settings filename in the Letterbox config directory
const SETTINGS_FILE: &str = "settings.json";

/// OAuth application identity used for consent and refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
}

/// Google Cloud Console credential file format (installed app)
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
}

impl ClientSecret {
    /// Load the client secret from `path`
    ///
    /// A missing file is `AuthError::MissingConfig` naming the path; a file
    /// that exists but cannot be read or parsed is `ConsentFailed`.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        Self::from_file(path).map_err(|e| AuthError::ConsentFailed {
            reason: format!("{e:#}"),
        })
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Support both "installed" (desktop) and "web" credential types
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret,
        })
    }
}

/// Optional behaviours, replacing the forked program variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Allow composing and sending mail (requires the send scope)
    pub send: bool,
    /// Send a welcome message to the account after a fresh grant
    pub welcome_email: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            send: true,
            welcome_email: false,
        }
    }
}

impl Capabilities {
    /// Scopes a credential must carry for these capabilities
    pub fn required_scopes(&self) -> ScopeSet {
        let mut scopes = vec![Scope::Read];
        if self.send || self.welcome_email {
            scopes.push(Scope::Send);
        }
        scopes.into_iter().collect()
    }
}

/// Caller-side retry policy for transient remote failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per call; 1 means no retry
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 100,
        }
    }
}

/// User-tunable settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mailbox label to synchronize
    pub folder: String,
    /// Size of the recent window fetched per refresh
    pub fetch_limit: usize,
    pub capabilities: Capabilities,
    pub client_secret_path: Option<PathBuf>,
    pub token_path: Option<PathBuf>,
    /// Loopback port for the consent callback; 0 picks a free port
    pub callback_port: u16,
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder: "INBOX".to_string(),
            fetch_limit: 10,
            capabilities: Capabilities::default(),
            client_secret_path: None,
            token_path: None,
            callback_port: 0,
            request_timeout_secs: 30,
            retry: RetrySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the config directory, or defaults when absent
    pub fn load() -> Result<Self> {
        if config::config_exists(SETTINGS_FILE) {
            return config::load_json(SETTINGS_FILE);
        }
        Ok(Self::default())
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Client secret location (defaults to `credentials.json` next to the executable)
    pub fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| config::program_path(CLIENT_SECRET_FILE))
    }

    /// Credential file location (defaults to `token.json` next to the executable)
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| config::program_path(TOKEN_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_credentials() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;

        let creds = ClientSecret::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-client-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn test_parse_web_credentials() {
        let json = r#"{
            "web": {
                "client_id": "web-client-id.apps.googleusercontent.com",
                "client_secret": "web-secret"
            }
        }"#;

        let creds = ClientSecret::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-client-id.apps.googleusercontent.com");
    }

    #[test]
    fn test_invalid_json() {
        let json = r#"{ "other": {} }"#;
        assert!(ClientSecret::from_json(json).is_err());
    }

    #[test]
    fn test_missing_client_secret_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        match ClientSecret::load(&path) {
            Err(AuthError::MissingConfig { path: missing }) => assert_eq!(missing, path),
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_client_secret_is_consent_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            ClientSecret::load(&path),
            Err(AuthError::ConsentFailed { .. })
        ));
    }

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{ "fetch_limit": 25 }"#).unwrap();
        assert_eq!(settings.fetch_limit, 25);
        assert_eq!(settings.folder, "INBOX");
        assert_eq!(settings.retry.max_attempts, 1);
        assert!(settings.capabilities.send);
        assert!(!settings.capabilities.welcome_email);
    }

    #[test]
    fn test_required_scopes_follow_capabilities() {
        let read_only = Capabilities {
            send: false,
            welcome_email: false,
        };
        assert_eq!(read_only.required_scopes(), [Scope::Read].into_iter().collect());

        let full = Capabilities::default();
        assert!(full.required_scopes().contains(Scope::Send));
    }
}
