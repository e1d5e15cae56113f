//! Marker Store
//!
//! The only persisted state in the system: two single-line handshake files
//! in the snapshot repository, recording the last snapshot id the primary
//! completed and the last snapshot id the secondary restored. An absent
//! file, an empty file and a populated file are three distinct states.

use std::path::PathBuf;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Primary's own marker: last fully completed snapshot id
pub const PRIMARY_MARKER: &str = "primary_snapshot.id";

/// Secondary's own marker: last fully restored snapshot id
pub const SECONDARY_MARKER: &str = "secondary_snapshot.id";

/// Decoded state of a marker file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// File does not exist: the operation never completed (or never ran)
    Absent,
    /// File exists but is empty: an operation is in flight, id pending
    Pending,
    /// File holds the id of the last fully completed operation
    Completed(String),
}

impl Marker {
    /// True when the marker records the given id
    pub fn is_completed_as(&self, id: &str) -> bool {
        matches!(self, Marker::Completed(v) if v == id)
    }
}

/// Peer endpoint for remote marker writes
#[derive(Debug, Clone)]
pub struct RemotePeer {
    /// Hostname the write is executed on (over ssh)
    pub host: String,
    /// Repository path on the peer host
    pub repo_dir: PathBuf,
}

/// Reads and writes the handshake marker files.
///
/// Reads are always local: both markers live in the shared repository path.
/// Writes go to the local repository, or to the peer's copy of it when a
/// remote peer is configured (the write-restricted role after failover).
pub struct MarkerStore {
    repo_dir: PathBuf,
    remote: Option<RemotePeer>,
}

impl MarkerStore {
    /// Create a store writing to the local repository path
    pub fn local(repo_dir: PathBuf) -> Self {
        Self {
            repo_dir,
            remote: None,
        }
    }

    /// Create a store that reads locally but writes on the peer host
    pub fn remote(repo_dir: PathBuf, peer: RemotePeer) -> Self {
        Self {
            repo_dir,
            remote: Some(peer),
        }
    }

    /// Read a marker file; `Absent` when the path does not exist
    pub fn read(&self, file: &str) -> Result<Marker> {
        let path = self.repo_dir.join(file);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Marker::Absent),
            Err(e) => return Err(e.into()),
        };

        let line = content.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            Ok(Marker::Pending)
        } else {
            Ok(Marker::Completed(line.to_string()))
        }
    }

    /// Write a marker value; an empty value encodes "id pending".
    ///
    /// The write must succeed before the caller takes any further action:
    /// a failed write fails the whole tick.
    pub async fn write(&self, file: &str, value: &str) -> Result<()> {
        match &self.remote {
            None => {
                let path = self.repo_dir.join(file);
                std::fs::write(&path, format!("{}\n", value))?;
                Ok(())
            }
            Some(peer) => self.write_remote(peer, file, value).await,
        }
    }

    /// Execute the equivalent write on the peer host over ssh
    async fn write_remote(&self, peer: &RemotePeer, file: &str, value: &str) -> Result<()> {
        let target = peer.repo_dir.join(file);
        let script = format!("printf '%s\\n' '{}' > '{}'", value, target.display());

        let output = Command::new("ssh")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg(&peer.host)
            .arg(&script)
            .output()
            .await
            .map_err(|e| Error::RemoteWrite {
                host: peer.host.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RemoteWrite {
                host: peer.host.clone(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}
