//! Bounded mailbox sync
//!
//! Fetches the most recent window of a folder and replaces the shared
//! snapshot in one step.

mod inbox;
mod snapshot;

pub use inbox::{InboxSync, SyncStats, sync_inbox};
pub use snapshot::{SharedSnapshot, Snapshot};
