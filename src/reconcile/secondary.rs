//! Secondary Tick
//!
//! Decides whether the secondary cluster should restore this tick, and
//! runs the pre-/post-restore index operations around each restore.

use crate::admin::{AdminClient, ALL_INDICES_PATTERN};
use crate::error::Result;
use crate::marker::{Marker, SECONDARY_MARKER};
use crate::probe::{RestoreStatus, SnapshotEngine, SnapshotStatus};

use super::{Reconciler, TickOutcome, WaitReason};

impl<E: SnapshotEngine, A: AdminClient> Reconciler<E, A> {
    /// One evaluation of the secondary decision procedure.
    ///
    /// 1. Nothing upstream to restore: wait.
    /// 2. Restore running: wait.
    /// 3. Own marker pending after a finished restore: record the restored
    ///    id, run post-restore operations, done — a new restore is never
    ///    started in the same tick as an acknowledgement.
    /// 4. New snapshot available (first run, or the listing moved past the
    ///    recorded id): mark pending, run pre-restore operations, restore.
    pub(super) async fn secondary_tick(&self) -> Result<TickOutcome> {
        if self.engine.snapshot_status().await? == SnapshotStatus::NoSnapshotsExist {
            return Ok(TickOutcome::Waiting(WaitReason::NoSnapshots));
        }

        if self.engine.restore_status().await? == RestoreStatus::InProgress {
            return Ok(TickOutcome::Waiting(WaitReason::RestoreInProgress));
        }

        let own = self.markers.read(SECONDARY_MARKER)?;

        if own == Marker::Pending {
            let id = self.latest_snapshot_id().await?;
            tracing::info!("Restore finished, recording restored snapshot id {}", id);
            self.markers.write(SECONDARY_MARKER, &id).await?;
            self.post_restore().await?;
            return Ok(TickOutcome::RestoreRecorded(id));
        }

        let latest = self.latest_snapshot_id().await?;
        let new_available = match &own {
            Marker::Absent => true,
            Marker::Completed(id) => id != &latest,
            Marker::Pending => unreachable!("pending handled above"),
        };

        if !new_available {
            return Ok(TickOutcome::Waiting(WaitReason::NothingNew));
        }

        tracing::info!("New snapshot {} available, starting restore", latest);
        self.markers.write(SECONDARY_MARKER, "").await?;
        self.pre_restore().await?;
        self.engine.start_restore(&latest).await?;
        Ok(TickOutcome::RestoreStarted(latest))
    }

    /// Stop lifecycle management and close every index, hidden and system
    /// indices included, so the restore cannot collide with open handles.
    async fn pre_restore(&self) -> Result<()> {
        tracing::info!("Pre-restore: stopping index-lifecycle management");
        self.admin.ilm_stop().await?;

        let indices = self.admin.list_indices(ALL_INDICES_PATTERN).await?;
        tracing::info!("Pre-restore: closing {} indices", indices.len());
        for index in &indices {
            self.admin.close_index(index).await?;
        }
        Ok(())
    }

    /// Restart lifecycle management after a restore. Re-opening indices is
    /// the restore's own job, not performed here.
    async fn post_restore(&self) -> Result<()> {
        tracing::info!("Post-restore: restarting index-lifecycle management");
        self.admin.ilm_start().await
    }
}
