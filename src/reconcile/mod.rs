//! Reconciliation Engine
//!
//! The per-role decision procedure at the heart of SnapSync. Once per tick
//! the engine inspects external state (snapshot/restore status, the marker
//! handshake) and decides whether to start an operation, wait, or do
//! nothing. Each tick runs to completion before the next begins; no two
//! snapshot or restore operations ever overlap, and no operation is
//! skipped or duplicated across ticks.
//!
//! Cross-node coordination is a polled marker file, not a lock: primary
//! and secondary ticks may race within one polling interval, which is
//! accepted and bounded rather than mitigated.

mod cleanup;
mod primary;
mod secondary;

use crate::admin::AdminClient;
use crate::config::{Role, RoleConfig};
use crate::error::{Error, Result};
use crate::marker::MarkerStore;
use crate::probe::SnapshotEngine;

/// Terminal outcome of one successful tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Primary triggered the first, full snapshot
    FullSnapshotStarted,
    /// Primary triggered a follow-up incremental snapshot
    IncrementalSnapshotStarted,
    /// Secondary triggered a restore of the named snapshot
    RestoreStarted(String),
    /// Secondary acknowledged a finished restore of the named snapshot
    RestoreRecorded(String),
    /// Cleanup deleted this many snapshots beyond the retention count
    SnapshotsDeleted(usize),
    /// Nothing to do this tick
    Waiting(WaitReason),
}

/// Why a tick ended without starting an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// A snapshot is already running
    SnapshotInProgress,
    /// A restore is already running
    RestoreInProgress,
    /// The peer has not yet consumed the last snapshot
    PeerBehind,
    /// The repository holds no snapshots yet
    NoSnapshots,
    /// No snapshot newer than the last restored one
    NothingNew,
}

impl std::fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickOutcome::FullSnapshotStarted => write!(f, "full snapshot started"),
            TickOutcome::IncrementalSnapshotStarted => {
                write!(f, "incremental snapshot started")
            }
            TickOutcome::RestoreStarted(id) => write!(f, "restore of {} started", id),
            TickOutcome::RestoreRecorded(id) => write!(f, "restore of {} recorded", id),
            TickOutcome::SnapshotsDeleted(n) => write!(f, "{} snapshots deleted", n),
            TickOutcome::Waiting(reason) => write!(f, "waiting: {}", reason),
        }
    }
}

impl std::fmt::Display for WaitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitReason::SnapshotInProgress => write!(f, "snapshot in progress"),
            WaitReason::RestoreInProgress => write!(f, "restore in progress"),
            WaitReason::PeerBehind => write!(f, "peer has not consumed the last snapshot"),
            WaitReason::NoSnapshots => write!(f, "no snapshots exist yet"),
            WaitReason::NothingNew => write!(f, "no new snapshot available"),
        }
    }
}

/// The per-role reconciliation engine
pub struct Reconciler<E, A> {
    role: Role,
    node: RoleConfig,
    markers: MarkerStore,
    engine: E,
    admin: A,
    /// Snapshots to keep in Cleanup role
    retention: usize,
}

impl<E: SnapshotEngine, A: AdminClient> Reconciler<E, A> {
    /// Create a reconciler for one role
    pub fn new(
        role: Role,
        node: RoleConfig,
        markers: MarkerStore,
        engine: E,
        admin: A,
        retention: usize,
    ) -> Self {
        Self {
            role,
            node,
            markers,
            engine,
            admin,
            retention,
        }
    }

    /// One-time repository registration, before the first tick.
    ///
    /// The secondary registers read-only; primary and cleanup need write
    /// access (cleanup deletes). Failure here prevents any tick.
    pub async fn register_repository(&self) -> Result<()> {
        let readonly = self.role == Role::Secondary;
        tracing::info!(
            "Registering repository {} at {} (readonly: {})",
            self.node.repo_name,
            self.node.repo_dir.display(),
            readonly
        );
        self.admin
            .register_repository(&self.node.repo_name, &self.node.repo_dir, readonly)
            .await
    }

    /// Run one tick of this role's decision procedure
    pub async fn tick(&self) -> Result<TickOutcome> {
        match self.role {
            Role::Primary => self.primary_tick().await,
            Role::Secondary => self.secondary_tick().await,
            Role::Cleanup => self.cleanup_tick().await,
        }
    }

    /// Resolve the id of the most recent snapshot from the listing
    async fn latest_snapshot_id(&self) -> Result<String> {
        let snapshots = self.engine.list_snapshots().await?;
        snapshots
            .into_iter()
            .next()
            .ok_or_else(|| Error::Engine("snapshot listing is unexpectedly empty".to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::admin::AdminClient;
    use crate::config::RoleConfig;
    use crate::error::Result;
    use crate::probe::{
        RestoreStatus, SnapshotEngine, SnapshotKind, SnapshotStatus,
    };

    /// Side-effecting engine invocation recorded by the mock
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum EngineCall {
        StartSnapshot(SnapshotKind),
        StartRestore(String),
    }

    /// Recording snapshot engine fed with canned state
    pub struct MockEngine {
        pub status: Mutex<SnapshotStatus>,
        pub restore: Mutex<RestoreStatus>,
        pub snapshots: Mutex<Vec<String>>,
        pub calls: Mutex<Vec<EngineCall>>,
    }

    impl MockEngine {
        pub fn new(status: SnapshotStatus, restore: RestoreStatus, snapshots: &[&str]) -> Self {
            Self {
                status: Mutex::new(status),
                restore: Mutex::new(restore),
                snapshots: Mutex::new(snapshots.iter().map(|s| s.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<EngineCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl SnapshotEngine for &MockEngine {
        async fn snapshot_status(&self) -> Result<SnapshotStatus> {
            Ok(self.status.lock().unwrap().clone())
        }

        async fn restore_status(&self) -> Result<RestoreStatus> {
            Ok(*self.restore.lock().unwrap())
        }

        async fn list_snapshots(&self) -> Result<Vec<String>> {
            Ok(self.snapshots.lock().unwrap().clone())
        }

        async fn start_snapshot(&self, kind: SnapshotKind) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(EngineCall::StartSnapshot(kind));
            Ok(())
        }

        async fn start_restore(&self, snapshot: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(EngineCall::StartRestore(snapshot.to_string()));
            Ok(())
        }
    }

    /// Admin API invocation recorded by the mock
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum AdminCall {
        RegisterRepository { readonly: bool },
        CloseIndex(String),
        OpenIndex(String),
        IlmStart,
        IlmStop,
        DeleteSnapshot(String),
    }

    /// Recording admin client with a canned index catalog
    pub struct MockAdmin {
        pub indices: Vec<String>,
        pub calls: Mutex<Vec<AdminCall>>,
    }

    impl MockAdmin {
        pub fn new(indices: &[&str]) -> Self {
            Self {
                indices: indices.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<AdminCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: AdminCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait::async_trait]
    impl AdminClient for &MockAdmin {
        async fn register_repository(
            &self,
            _repo: &str,
            _location: &Path,
            readonly: bool,
        ) -> Result<()> {
            self.record(AdminCall::RegisterRepository { readonly });
            Ok(())
        }

        async fn close_index(&self, index: &str) -> Result<()> {
            self.record(AdminCall::CloseIndex(index.to_string()));
            Ok(())
        }

        async fn open_index(&self, index: &str) -> Result<()> {
            self.record(AdminCall::OpenIndex(index.to_string()));
            Ok(())
        }

        async fn ilm_start(&self) -> Result<()> {
            self.record(AdminCall::IlmStart);
            Ok(())
        }

        async fn ilm_stop(&self) -> Result<()> {
            self.record(AdminCall::IlmStop);
            Ok(())
        }

        async fn delete_snapshot(&self, _repo: &str, snapshot: &str) -> Result<()> {
            self.record(AdminCall::DeleteSnapshot(snapshot.to_string()));
            Ok(())
        }

        async fn list_indices(&self, _pattern: &str) -> Result<Vec<String>> {
            Ok(self.indices.clone())
        }
    }

    /// Role config pointing at a temp repository
    pub fn test_node(repo_dir: &Path) -> RoleConfig {
        RoleConfig {
            install_dir: PathBuf::from("/usr/share/searchd"),
            repo_dir: repo_dir.to_path_buf(),
            api_url: "http://127.0.0.1:9200".to_string(),
            repo_name: "dr-snapshots".to_string(),
            peer_host: None,
            peer_repo_dir: None,
        }
    }
}
