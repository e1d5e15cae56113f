//! Command Probe Adapter
//!
//! Drives the engine's `snaptool` admin command and parses its text output
//! into the typed status enums. The text contract:
//!
//! - `snaptool snapshots --repo <name>`: one snapshot id per non-empty
//!   line, most-recent-first, or the sentinel `No snapshots found`.
//! - `snaptool snapshot-status --repo <name>`: scannable for `SUCCESS`
//!   (completed) or `STARTED` (running); any other state token surfaces as
//!   `InProgress(Other(..))`.
//! - `snaptool restore-status`: scannable for `Restore complete` or
//!   `No restore`; anything else means a restore is in flight.

use std::path::PathBuf;

use tokio::process::Command;

use super::{RestoreStatus, SnapshotKind, SnapshotStatus, StateTag};
use crate::error::{Error, Result};

const NO_SNAPSHOTS_SENTINEL: &str = "No snapshots found";
const SNAPSHOT_SUCCESS_SENTINEL: &str = "SUCCESS";
const SNAPSHOT_STARTED_SENTINEL: &str = "STARTED";
const RESTORE_COMPLETE_SENTINEL: &str = "Restore complete";
const RESTORE_NOT_STARTED_SENTINEL: &str = "No restore";

/// Snapshot engine adapter invoking `{install_dir}/bin/snaptool`
pub struct CommandEngine {
    snaptool: PathBuf,
    repo_name: String,
}

impl CommandEngine {
    /// Create an adapter for the given tool path and repository name
    pub fn new(snaptool: PathBuf, repo_name: String) -> Self {
        Self { snaptool, repo_name }
    }

    /// Run snaptool with the given arguments and return its stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.snaptool)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                Error::Engine(format!(
                    "failed to invoke {}: {}",
                    self.snaptool.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Engine(format!(
                "snaptool {} failed ({}): {}",
                args.first().unwrap_or(&""),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl super::SnapshotEngine for CommandEngine {
    async fn snapshot_status(&self) -> Result<SnapshotStatus> {
        // Existence comes from the listing; the status command is only
        // meaningful once at least one snapshot exists.
        let listing = self.run(&["snapshots", "--repo", &self.repo_name]).await?;
        if parse_snapshot_listing(&listing).is_empty() {
            return Ok(SnapshotStatus::NoSnapshotsExist);
        }

        let status = self
            .run(&["snapshot-status", "--repo", &self.repo_name])
            .await?;
        Ok(parse_snapshot_status(&status))
    }

    async fn restore_status(&self) -> Result<RestoreStatus> {
        let output = self.run(&["restore-status"]).await?;
        Ok(parse_restore_status(&output))
    }

    async fn list_snapshots(&self) -> Result<Vec<String>> {
        let output = self.run(&["snapshots", "--repo", &self.repo_name]).await?;
        Ok(parse_snapshot_listing(&output))
    }

    async fn start_snapshot(&self, kind: SnapshotKind) -> Result<()> {
        let mut args = vec!["snapshot", "--repo", self.repo_name.as_str()];
        if kind == SnapshotKind::Full {
            args.push("--full");
        }
        self.run(&args).await?;
        Ok(())
    }

    async fn start_restore(&self, snapshot: &str) -> Result<()> {
        self.run(&["restore", "--repo", &self.repo_name, "--snapshot", snapshot])
            .await?;
        Ok(())
    }
}

/// Parse the snapshot listing: ids, most-recent-first
fn parse_snapshot_listing(output: &str) -> Vec<String> {
    if output.contains(NO_SNAPSHOTS_SENTINEL) {
        return Vec::new();
    }

    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Parse the snapshot-status output of a non-empty repository
fn parse_snapshot_status(output: &str) -> SnapshotStatus {
    if output.contains(SNAPSHOT_SUCCESS_SENTINEL) {
        SnapshotStatus::Completed
    } else if output.contains(SNAPSHOT_STARTED_SENTINEL) {
        SnapshotStatus::InProgress(StateTag::Started)
    } else {
        SnapshotStatus::InProgress(StateTag::Other(output.trim().to_string()))
    }
}

/// Parse the restore-status output
fn parse_restore_status(output: &str) -> RestoreStatus {
    if output.contains(RESTORE_COMPLETE_SENTINEL) {
        RestoreStatus::Complete
    } else if output.contains(RESTORE_NOT_STARTED_SENTINEL) {
        RestoreStatus::NotStarted
    } else {
        RestoreStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_sentinel_means_empty() {
        assert!(parse_snapshot_listing("No snapshots found\n").is_empty());
    }

    #[test]
    fn test_listing_is_most_recent_first() {
        let ids = parse_snapshot_listing("snap-9 2026-08-30\nsnap-8 2026-08-29\n\nsnap-7 2026-08-28\n");
        assert_eq!(ids, vec!["snap-9", "snap-8", "snap-7"]);
    }

    #[test]
    fn test_snapshot_status_success() {
        let status = parse_snapshot_status("snap-9: state SUCCESS, 42 shards\n");
        assert_eq!(status, SnapshotStatus::Completed);
    }

    #[test]
    fn test_snapshot_status_started() {
        let status = parse_snapshot_status("snap-9: state STARTED\n");
        assert_eq!(status, SnapshotStatus::InProgress(StateTag::Started));
    }

    #[test]
    fn test_snapshot_status_unexpected_tag() {
        match parse_snapshot_status("snap-9: state PARTIAL\n") {
            SnapshotStatus::InProgress(StateTag::Other(raw)) => {
                assert!(raw.contains("PARTIAL"));
            }
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[test]
    fn test_restore_status_variants() {
        assert_eq!(
            parse_restore_status("Restore complete (snap-7)\n"),
            RestoreStatus::Complete
        );
        assert_eq!(
            parse_restore_status("No restore started\n"),
            RestoreStatus::NotStarted
        );
        assert_eq!(
            parse_restore_status("Restoring shard 3 of 12\n"),
            RestoreStatus::InProgress
        );
    }
}
