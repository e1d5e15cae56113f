//! Cleanup Tick
//!
//! Enforces the snapshot retention policy: keep the newest `retention`
//! snapshots, delete the rest.

use crate::admin::AdminClient;
use crate::error::Result;
use crate::probe::SnapshotEngine;

use super::{Reconciler, TickOutcome};

impl<E: SnapshotEngine, A: AdminClient> Reconciler<E, A> {
    /// Delete every snapshot beyond the retention count.
    ///
    /// The listing order is trusted to be most-recent-first (see
    /// [`SnapshotEngine::list_snapshots`]); the first `retention` entries
    /// survive. A failed deletion fails the whole tick, no partial
    /// continue.
    pub(super) async fn cleanup_tick(&self) -> Result<TickOutcome> {
        let snapshots = self.engine.list_snapshots().await?;

        if snapshots.len() <= self.retention {
            tracing::info!(
                "Retention satisfied: {} snapshots, keeping {}",
                snapshots.len(),
                self.retention
            );
            return Ok(TickOutcome::SnapshotsDeleted(0));
        }

        let mut deleted = 0;
        for snapshot in &snapshots[self.retention..] {
            tracing::info!("Deleting snapshot {} beyond retention", snapshot);
            self.admin
                .delete_snapshot(&self.node.repo_name, snapshot)
                .await?;
            deleted += 1;
        }

        Ok(TickOutcome::SnapshotsDeleted(deleted))
    }
}
