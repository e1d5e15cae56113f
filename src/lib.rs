//! SnapSync - Disaster-Recovery Snapshot Replication Coordinator
//!
//! SnapSync keeps two clusters of a document-indexing/search engine in
//! disaster-recovery lockstep through a shared snapshot repository: a
//! primary node periodically produces point-in-time snapshots, a secondary
//! node periodically restores the latest one, and a cleanup mode enforces
//! a retention policy over stored snapshots.
//!
//! # Architecture
//!
//! The core is the reconciliation engine: a once-per-tick decision
//! procedure that inspects external state (snapshot/restore status from
//! the engine's admin command, a cross-node marker handshake) and decides
//! whether to start an operation, wait, or do nothing. No two snapshot or
//! restore operations ever overlap, and no operation is skipped or
//! duplicated across ticks.
//!
//! Cross-node coordination carries no lock or consensus protocol: the two
//! marker files in the shared repository are a best-effort, eventually
//! consistent handshake, with staleness bounded by the polling interval.
//!
//! # Features
//!
//! - Primary, secondary and cleanup roles from one binary
//! - Typed status probing of the snapshot engine's text output
//! - Marker handshake with local or remote (ssh) writes for read-only
//!   filesystems after failover
//! - Pre-/post-restore index operations (lifecycle pause, close-all)
//! - One-shot or daemon scheduling with prompt, between-tick cancellation

pub mod admin;
pub mod config;
pub mod error;
pub mod marker;
pub mod probe;
pub mod reconcile;
pub mod scheduler;

pub use config::SnapSyncConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::admin::{AdminClient, HttpAdminClient};
    pub use crate::config::{Role, RoleConfig, SnapSyncConfig};
    pub use crate::error::{Error, Result};
    pub use crate::marker::{Marker, MarkerStore};
    pub use crate::probe::{CommandEngine, SnapshotEngine};
    pub use crate::reconcile::{Reconciler, TickOutcome};
    pub use crate::scheduler::Scheduler;
}
