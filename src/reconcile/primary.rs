//! Primary Tick
//!
//! Decides whether the primary cluster should start a snapshot this tick.
//! Evaluated in order, each branch terminal for the tick.

use crate::admin::AdminClient;
use crate::error::{Error, Result};
use crate::marker::{Marker, PRIMARY_MARKER, SECONDARY_MARKER};
use crate::probe::{SnapshotEngine, SnapshotKind, SnapshotStatus, StateTag};

use super::{Reconciler, TickOutcome, WaitReason};

impl<E: SnapshotEngine, A: AdminClient> Reconciler<E, A> {
    /// One evaluation of the primary decision procedure.
    ///
    /// 1. No snapshots yet: start a full snapshot, mark own id pending.
    /// 2. Snapshot running: wait. Any other in-progress state is an error.
    /// 3. Own marker pending after a finished snapshot: record the id,
    ///    then keep going in the same tick.
    /// 4. Peer has not restored the latest snapshot: wait, so repository
    ///    growth stays bounded and the peer is not raced.
    /// 5. Otherwise start an incremental snapshot, mark own id pending.
    pub(super) async fn primary_tick(&self) -> Result<TickOutcome> {
        match self.engine.snapshot_status().await? {
            SnapshotStatus::NoSnapshotsExist => {
                tracing::info!("No snapshots exist, starting initial full snapshot");
                self.engine.start_snapshot(SnapshotKind::Full).await?;
                self.markers.write(PRIMARY_MARKER, "").await?;
                return Ok(TickOutcome::FullSnapshotStarted);
            }
            SnapshotStatus::InProgress(StateTag::Started) => {
                return Ok(TickOutcome::Waiting(WaitReason::SnapshotInProgress));
            }
            SnapshotStatus::InProgress(StateTag::Other(raw)) => {
                return Err(Error::EngineState(raw));
            }
            SnapshotStatus::Completed => {}
        }

        // A previous snapshot finished but its id was never recorded
        if self.markers.read(PRIMARY_MARKER)? == Marker::Pending {
            let id = self.latest_snapshot_id().await?;
            tracing::info!("Recording completed snapshot id {}", id);
            self.markers.write(PRIMARY_MARKER, &id).await?;
        }

        let latest = self.latest_snapshot_id().await?;
        let peer = self.markers.read(SECONDARY_MARKER)?;
        if !peer.is_completed_as(&latest) {
            tracing::info!(
                "Secondary has not restored {} yet, holding back next snapshot",
                latest
            );
            return Ok(TickOutcome::Waiting(WaitReason::PeerBehind));
        }

        tracing::info!("Secondary caught up to {}, starting incremental snapshot", latest);
        self.engine.start_snapshot(SnapshotKind::Incremental).await?;
        self.markers.write(PRIMARY_MARKER, "").await?;
        Ok(TickOutcome::IncrementalSnapshotStarted)
    }
}
