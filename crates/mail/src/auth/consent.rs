//! Interactive consent as an isolated background task
//!
//! Consent waits on the user and a browser redirect, so it runs on its own
//! thread. The handle is consumed when the result is taken, which makes the
//! delivery happen exactly once.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use super::oauth::{AuthorizationServer, TokenGrant};
use crate::config::ClientSecret;
use crate::error::AuthError;
use crate::models::ScopeSet;

/// Handle to a running consent flow
pub struct ConsentTask {
    rx: Receiver<Result<TokenGrant, AuthError>>,
}

impl ConsentTask {
    /// Start the consent flow on a background thread
    pub fn spawn(
        server: Arc<dyn AuthorizationServer>,
        client: ClientSecret,
        scopes: ScopeSet,
    ) -> Result<Self, AuthError> {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("consent".to_string())
            .spawn(move || {
                let result = server.consent(&client, &scopes);
                // The receiver may be gone if the session ended meanwhile
                let _ = tx.send(result);
            })
            .map_err(|e| AuthError::ConsentFailed {
                reason: format!("failed to start consent task: {e}"),
            })?;
        Ok(Self { rx })
    }

    /// Block until the flow completes
    pub fn wait(self) -> Result<TokenGrant, AuthError> {
        self.rx.recv().unwrap_or_else(|_| Err(Self::vanished()))
    }

    fn vanished() -> AuthError {
        AuthError::ConsentFailed {
            reason: "consent task ended without a result".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    /// Consent completes when the test releases it
    struct GatedServer {
        gate: Mutex<Receiver<()>>,
    }

    impl AuthorizationServer for GatedServer {
        fn refresh(&self, _: &ClientSecret, _: &str) -> Result<TokenGrant, AuthError> {
            unreachable!()
        }

        fn consent(&self, _: &ClientSecret, _: &ScopeSet) -> Result<TokenGrant, AuthError> {
            self.gate.lock().unwrap().recv().unwrap();
            Ok(TokenGrant {
                access_token: "granted".into(),
                refresh_token: Some("r".into()),
                expires_in: Some(3600),
                scope: None,
            })
        }
    }

    struct PanickingServer;

    impl AuthorizationServer for PanickingServer {
        fn refresh(&self, _: &ClientSecret, _: &str) -> Result<TokenGrant, AuthError> {
            unreachable!()
        }

        fn consent(&self, _: &ClientSecret, _: &ScopeSet) -> Result<TokenGrant, AuthError> {
            panic!("browser exploded")
        }
    }

    fn client() -> ClientSecret {
        ClientSecret {
            client_id: "id".into(),
            client_secret: "secret".into(),
        }
    }

    fn gated() -> (Arc<GatedServer>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Arc::new(GatedServer {
                gate: Mutex::new(rx),
            }),
            tx,
        )
    }

    #[test]
    fn test_wait_blocks_until_flow_completes() {
        let (server, release) = gated();
        let task = ConsentTask::spawn(server, client(), ScopeSet::new()).unwrap();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            release.send(()).unwrap();
        });

        let grant = task.wait().unwrap();
        assert_eq!(grant.access_token, "granted");
        releaser.join().unwrap();
    }

    #[test]
    fn test_panicking_flow_is_consent_failure() {
        let task = ConsentTask::spawn(Arc::new(PanickingServer), client(), ScopeSet::new()).unwrap();
        assert!(matches!(task.wait(), Err(AuthError::ConsentFailed { .. })));
    }
}
