//! Status Probe
//!
//! Typed view of the snapshot/restore engine. All free-text matching on
//! engine output is confined to the [`command`] adapter; the reconciliation
//! engine only ever sees the enums defined here.

pub mod command;

pub use command::CommandEngine;

use crate::error::Result;

/// State tag of an in-progress snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateTag {
    /// Snapshot is running normally
    Started,
    /// Any other reported state (failed, partial, unknown)
    Other(String),
}

/// State of the most recent snapshot operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// The repository holds no snapshots at all
    NoSnapshotsExist,
    /// A snapshot operation is in flight
    InProgress(StateTag),
    /// The most recent snapshot completed successfully
    Completed,
}

/// State of the most recent restore operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStatus {
    /// No restore has been started
    NotStarted,
    /// A restore is in flight
    InProgress,
    /// The most recent restore completed
    Complete,
}

/// Kind of snapshot to trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// First snapshot of the repository
    Full,
    /// Follow-up snapshot on top of existing segments
    Incremental,
}

/// Interface to the snapshot/restore execution engine.
///
/// Implemented by [`CommandEngine`] in production and by recording mocks
/// in the reconciler tests.
#[async_trait::async_trait]
pub trait SnapshotEngine: Send + Sync {
    /// State of the most recent snapshot operation
    async fn snapshot_status(&self) -> Result<SnapshotStatus>;

    /// State of the most recent restore operation
    async fn restore_status(&self) -> Result<RestoreStatus>;

    /// All snapshot ids in the repository.
    ///
    /// Precondition: the engine reports snapshots most-recent-first. The
    /// listing order is trusted as-is for retention decisions and for
    /// resolving the latest id; it is never re-sorted or verified here.
    async fn list_snapshots(&self) -> Result<Vec<String>>;

    /// Trigger a snapshot; returns once the engine has accepted the request
    async fn start_snapshot(&self, kind: SnapshotKind) -> Result<()>;

    /// Trigger a restore of the named snapshot
    async fn start_restore(&self, snapshot: &str) -> Result<()>;
}
