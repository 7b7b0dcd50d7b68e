//! Google OAuth2 endpoints
//!
//! Implements the installed-app authorization code flow. A loopback listener
//! receives the browser redirect. Uses synchronous HTTP (ureq) to be
//! executor-agnostic.

use chrono::{Duration, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

use crate::config::ClientSecret;
use crate::error::AuthError;
use crate::models::{Credential, ScopeSet};

/// Token endpoint response, for both code exchange and refresh
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    /// Space-separated granted scopes
    pub scope: Option<String>,
}

impl TokenGrant {
    /// Turn the grant into a credential
    ///
    /// `previous` supplies the refresh token and scopes when the endpoint
    /// omits them (refresh responses usually carry no refresh token).
    pub fn into_credential(self, fallback_scopes: &ScopeSet, previous: Option<&Credential>) -> Credential {
        let scopes = match &self.scope {
            Some(granted) => ScopeSet::from_granted(granted),
            None => previous
                .map(|c| c.scopes.clone())
                .unwrap_or_else(|| fallback_scopes.clone()),
        };
        let refresh_token = self
            .refresh_token
            .or_else(|| previous.and_then(|c| c.refresh_token.clone()));

        Credential {
            access_token: self.access_token,
            refresh_token,
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs as i64)),
            scopes,
        }
    }
}

/// The provider's authorization endpoints
pub trait AuthorizationServer: Send + Sync {
    /// Exchange a refresh token for a new access token
    fn refresh(&self, client: &ClientSecret, refresh_token: &str) -> Result<TokenGrant, AuthError>;

    /// Run the interactive consent flow; blocks until the user responds
    fn consent(&self, client: &ClientSecret, scopes: &ScopeSet) -> Result<TokenGrant, AuthError>;
}

/// Google's OAuth2 endpoints
pub struct GoogleOAuth {
    agent: ureq::Agent,
    callback_port: u16,
}

impl GoogleOAuth {
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Create the endpoint client
    ///
    /// # Arguments
    /// * `callback_port` - Loopback port for the redirect; 0 picks a free port
    /// * `timeout` - Global timeout for token endpoint requests
    pub fn new(callback_port: u16, timeout: std::time::Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            callback_port,
        }
    }

    fn start_local_server(&self) -> Result<(TcpListener, u16), AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", self.callback_port)).map_err(|e| {
            AuthError::ConsentFailed {
                reason: format!("could not bind callback port {}: {e}", self.callback_port),
            }
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::ConsentFailed {
                reason: format!("could not read callback address: {e}"),
            })?
            .port();
        Ok((listener, port))
    }

    fn authorization_url(client: &ClientSecret, redirect_uri: &str, scopes: &ScopeSet) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&client.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.to_request_param()),
        )
    }

    /// Wait for the browser redirect and extract the authorization code
    fn wait_for_callback(listener: TcpListener) -> Result<String, AuthError> {
        let (mut stream, _) = listener.accept().map_err(|e| AuthError::ConsentFailed {
            reason: format!("failed to accept callback connection: {e}"),
        })?;

        let mut request_line = String::new();
        BufReader::new(&stream)
            .read_line(&mut request_line)
            .map_err(|e| AuthError::ConsentFailed {
                reason: format!("failed to read callback request: {e}"),
            })?;

        let outcome = parse_callback(&request_line);
        respond_to_browser(&mut stream, outcome.is_ok());
        outcome
    }

    fn exchange_code(
        &self,
        client: &ClientSecret,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, AuthError> {
        let mut response = self
            .agent
            .post(Self::TOKEN_URL)
            .send_form([
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .map_err(|e| AuthError::ConsentFailed {
                reason: format!("failed to exchange authorization code: {e}"),
            })?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| AuthError::ConsentFailed {
                reason: format!("failed to parse token response: {e}"),
            })
    }
}

impl AuthorizationServer for GoogleOAuth {
    fn refresh(&self, client: &ClientSecret, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        debug!("Refreshing access token");
        let mut response = self
            .agent
            .post(Self::TOKEN_URL)
            .send_form([
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
            })?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| AuthError::RefreshFailed {
                reason: format!("failed to parse refresh response: {e}"),
            })
    }

    fn consent(&self, client: &ClientSecret, scopes: &ScopeSet) -> Result<TokenGrant, AuthError> {
        let (listener, port) = self.start_local_server()?;
        let redirect_uri = format!("http://localhost:{port}");
        let auth_url = Self::authorization_url(client, &redirect_uri, scopes);

        // The user has to act on this, so it goes to stdout rather than the log
        println!("\n=== Gmail Authentication Required ===");
        println!("If the browser doesn't open, visit: {auth_url}");

        if let Err(e) = open::that(&auth_url) {
            warn!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        info!("Waiting for authorization on port {}", port);
        let code = Self::wait_for_callback(listener)?;

        debug!("Exchanging authorization code for tokens");
        let grant = self.exchange_code(client, &code, &redirect_uri)?;
        info!("Authorization granted");
        Ok(grant)
    }
}

/// Extract the authorization code from a request line like
/// `GET /?code=AUTH_CODE&scope=... HTTP/1.1`
fn parse_callback(request_line: &str) -> Result<String, AuthError> {
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::ConsentFailed {
            reason: "malformed callback request".to_string(),
        })?;

    let url = url::Url::parse(&format!("http://localhost{path}")).map_err(|e| {
        AuthError::ConsentFailed {
            reason: format!("malformed callback path: {e}"),
        }
    })?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" => {
                return Err(AuthError::ConsentFailed {
                    reason: format!("OAuth error: {value}"),
                });
            }
            "code" if code.is_none() => code = Some(value.into_owned()),
            _ => {}
        }
    }

    code.ok_or_else(|| AuthError::ConsentFailed {
        reason: "no authorization code received".to_string(),
    })
}

fn respond_to_browser(stream: &mut TcpStream, success: bool) {
    let (status, body) = if success {
        ("200 OK", "Authentication successful! You can close this window.")
    } else {
        ("400 Bad Request", "Authentication failed. Please try again.")
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
        status, body
    );
    if let Err(e) = stream.write_all(response.as_bytes()) {
        debug!("Could not answer browser: {}", e);
    }
}
