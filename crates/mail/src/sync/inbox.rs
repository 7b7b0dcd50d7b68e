//! Inbox sync implementation

use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Instant;

use crate::decode::summarize;
use crate::error::RemoteError;
use crate::models::MessageSummary;
use crate::remote::MailClient;

/// Statistics from a sync operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    /// Number of stubs the listing returned
    pub messages_listed: usize,
    /// Number of messages fetched and summarized
    pub messages_fetched: usize,
    /// Number of duplicate ids skipped
    pub messages_skipped: usize,
    /// Number of messages that could not be fetched
    pub errors: usize,
    /// Duration of the sync operation
    pub duration_ms: u64,
}

/// Result of a completed sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxSync {
    /// Summaries in provider order, ids unique
    pub summaries: Vec<MessageSummary>,
    pub stats: SyncStats,
}

/// Fetch summaries for the newest `limit` messages in `folder`
///
/// A failed listing fails the whole sync. A message that cannot be fetched
/// is skipped unless the failure means the credential was rejected, which
/// aborts the sync.
///
/// # Arguments
/// * `client` - Mail API client
/// * `folder` - Label or folder to list
/// * `limit` - Maximum number of messages to fetch
pub fn sync_inbox(
    client: &dyn MailClient,
    folder: &str,
    limit: usize,
) -> Result<InboxSync, RemoteError> {
    let start = Instant::now();
    let mut stats = SyncStats::default();

    // 1. List message ids
    let stubs = client.list(folder, limit)?;
    stats.messages_listed = stubs.len();
    debug!("Listed {} messages in {}", stubs.len(), folder);

    // 2. Fetch headers for each, in listing order
    let mut seen = HashSet::new();
    let mut summaries = Vec::with_capacity(stubs.len());

    for stub in stubs.into_iter().take(limit) {
        if !seen.insert(stub.id.clone()) {
            stats.messages_skipped += 1;
            continue;
        }

        match client.get(&stub.id) {
            Ok(raw) => {
                summaries.push(summarize(raw.id, &raw.headers));
                stats.messages_fetched += 1;
            }
            Err(e) if e.requires_reauth() => return Err(e),
            Err(e) => {
                warn!("Failed to fetch message {}: {}", stub.id, e);
                stats.errors += 1;
            }
        }
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Synced {}: {} fetched, {} skipped, {} errors in {}ms",
        folder, stats.messages_fetched, stats.messages_skipped, stats.errors, stats.duration_ms
    );

    Ok(InboxSync { summaries, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Header, MessageId, MessageStub, RawMessage, TransportPayload};
    use std::collections::HashMap;

    /// Serves canned listings and messages
    #[derive(Default)]
    struct CannedClient {
        listing: Vec<&'static str>,
        list_error: Option<RemoteError>,
        failures: HashMap<&'static str, RemoteError>,
    }

    impl MailClient for CannedClient {
        fn list(&self, _folder: &str, limit: usize) -> Result<Vec<MessageStub>, RemoteError> {
            if let Some(e) = &self.list_error {
                return Err(e.clone());
            }
            Ok(self
                .listing
                .iter()
                .take(limit)
                .map(|id| MessageStub { id: MessageId::new(*id) })
                .collect())
        }

        fn get(&self, id: &MessageId) -> Result<RawMessage, RemoteError> {
            if let Some(e) = self.failures.get(id.as_str()) {
                return Err(e.clone());
            }
            Ok(RawMessage {
                id: id.clone(),
                headers: vec![
                    Header::new("Subject", format!("Subject {id}")),
                    Header::new("From", "alice@example.com"),
                ],
                payload: None,
            })
        }

        fn send(&self, _payload: &TransportPayload) -> Result<MessageId, RemoteError> {
            unreachable!("sync never sends")
        }

        fn profile(&self) -> Result<String, RemoteError> {
            Ok("me@example.com".into())
        }
    }

    fn ids(sync: &InboxSync) -> Vec<&str> {
        sync.summaries.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_sync_keeps_listing_order() {
        let client = CannedClient {
            listing: vec!["m3", "m1", "m2"],
            ..Default::default()
        };
        let sync = sync_inbox(&client, "INBOX", 10).unwrap();

        assert_eq!(ids(&sync), vec!["m3", "m1", "m2"]);
        assert_eq!(sync.summaries[0].subject, "Subject m3");
        assert_eq!(sync.summaries[0].date, "Invalid Date");
        assert_eq!(sync.stats.messages_listed, 3);
        assert_eq!(sync.stats.messages_fetched, 3);
    }

    #[test]
    fn test_sync_respects_limit() {
        let client = CannedClient {
            listing: vec!["a", "b", "c", "d"],
            ..Default::default()
        };
        let sync = sync_inbox(&client, "INBOX", 2).unwrap();
        assert_eq!(ids(&sync), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_ids_skipped() {
        let client = CannedClient {
            listing: vec!["m1", "m2", "m1"],
            ..Default::default()
        };
        let sync = sync_inbox(&client, "INBOX", 10).unwrap();

        assert_eq!(ids(&sync), vec!["m1", "m2"]);
        assert_eq!(sync.stats.messages_skipped, 1);
    }

    #[test]
    fn test_empty_listing() {
        let sync = sync_inbox(&CannedClient::default(), "INBOX", 10).unwrap();
        assert!(sync.summaries.is_empty());
        assert_eq!(sync.stats.messages_listed, 0);
        assert_eq!(sync.stats.errors, 0);
    }

    #[test]
    fn test_item_failures_are_skipped() {
        let client = CannedClient {
            listing: vec!["gone", "ok", "busy", "bad"],
            failures: HashMap::from([
                ("gone", RemoteError::NotFound { resource: "message gone".into() }),
                ("busy", RemoteError::Transient { message: "503".into() }),
                ("bad", RemoteError::Rejected { status: 400, message: "bad".into() }),
            ]),
            ..Default::default()
        };
        let sync = sync_inbox(&client, "INBOX", 10).unwrap();

        assert_eq!(ids(&sync), vec!["ok"]);
        assert_eq!(sync.stats.errors, 3);
    }

    #[test]
    fn test_permanent_item_failure_aborts() {
        let client = CannedClient {
            listing: vec!["ok", "denied"],
            failures: HashMap::from([(
                "denied",
                RemoteError::Permanent { message: "401".into() },
            )]),
            ..Default::default()
        };
        let err = sync_inbox(&client, "INBOX", 10).unwrap_err();
        assert!(err.requires_reauth());
    }

    #[test]
    fn test_list_failure_fails_sync() {
        let client = CannedClient {
            list_error: Some(RemoteError::Transient { message: "timeout".into() }),
            ..Default::default()
        };
        assert!(sync_inbox(&client, "INBOX", 10).is_err());
    }
}
