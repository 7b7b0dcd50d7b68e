use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::MessageSummary;

/// The inbox as of the last completed sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub summaries: Vec<MessageSummary>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Snapshot shared between the controller and readers
///
/// Readers always see either the previous or the next list in full.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot(Arc<RwLock<Snapshot>>);

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current snapshot
    pub fn read(&self) -> Snapshot {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the whole list
    pub fn replace(&self, summaries: Vec<MessageSummary>) {
        let mut snapshot = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *snapshot = Snapshot {
            summaries,
            synced_at: Some(Utc::now()),
        };
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Snapshot::default();
    }
}
