//! SnapSync Configuration
//!
//! This module provides configuration structures for the SnapSync
//! disaster-recovery replication coordinator.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Replication role, fixed for the process lifetime.
///
/// Selects which configuration section and which tick procedure apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Produces snapshots into the shared repository
    Primary,
    /// Consumes snapshots by restoring them
    Secondary,
    /// Enforces the snapshot retention policy
    Cleanup,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Secondary => write!(f, "secondary"),
            Role::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Main SnapSync configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SnapSyncConfig {
    /// Primary-role configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<RoleConfig>,

    /// Secondary-role configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<RoleConfig>,

    /// Cleanup-role configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<RoleConfig>,
}

/// Per-role node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Search engine installation directory (contains bin/snaptool)
    pub install_dir: PathBuf,

    /// Snapshot repository filesystem path (also holds the marker files)
    pub repo_dir: PathBuf,

    /// Administration API base URL
    pub api_url: String,

    /// Registered snapshot repository name
    pub repo_name: String,

    /// Peer hostname for remote marker writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_host: Option<String>,

    /// Repository path on the peer host for remote marker writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_repo_dir: Option<PathBuf>,
}

impl SnapSyncConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: SnapSyncConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: SnapSyncConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve and validate the section for the active role.
    ///
    /// Every required field is checked here, before any tick runs; the
    /// peer fields are required only when remote marker writes are enabled.
    pub fn role(&self, role: Role, remote_marker: bool) -> crate::Result<&RoleConfig> {
        let section = match role {
            Role::Primary => self.primary.as_ref(),
            Role::Secondary => self.secondary.as_ref(),
            Role::Cleanup => self.cleanup.as_ref(),
        };

        let node = section.ok_or_else(|| {
            crate::Error::Config(format!("missing [{}] section in configuration", role))
        })?;
        node.validate(role, remote_marker)?;
        Ok(node)
    }
}

impl RoleConfig {
    /// Validate this section for the given role
    pub fn validate(&self, role: Role, remote_marker: bool) -> crate::Result<()> {
        if self.install_dir.as_os_str().is_empty() {
            return Err(crate::Error::Config(format!(
                "{}.install_dir cannot be empty",
                role
            )));
        }

        if self.repo_dir.as_os_str().is_empty() {
            return Err(crate::Error::Config(format!(
                "{}.repo_dir cannot be empty",
                role
            )));
        }

        if self.api_url.is_empty() {
            return Err(crate::Error::Config(format!(
                "{}.api_url cannot be empty",
                role
            )));
        }

        if self.repo_name.is_empty() {
            return Err(crate::Error::Config(format!(
                "{}.repo_name cannot be empty",
                role
            )));
        }

        if remote_marker {
            if self.peer_host.as_deref().map_or(true, str::is_empty) {
                return Err(crate::Error::Config(format!(
                    "{}.peer_host is required for remote marker writes",
                    role
                )));
            }
            if self
                .peer_repo_dir
                .as_ref()
                .map_or(true, |p| p.as_os_str().is_empty())
            {
                return Err(crate::Error::Config(format!(
                    "{}.peer_repo_dir is required for remote marker writes",
                    role
                )));
            }
        }

        Ok(())
    }

    /// Path of the engine's snapshot admin tool
    pub fn snaptool_path(&self) -> PathBuf {
        self.install_dir.join("bin").join("snaptool")
    }
}

/// Render a commented sample configuration file
pub fn sample_config() -> String {
    let sample = SnapSyncConfig {
        primary: Some(RoleConfig {
            install_dir: PathBuf::from("/usr/share/searchd"),
            repo_dir: PathBuf::from("/mnt/snapshots"),
            api_url: "http://127.0.0.1:9200".to_string(),
            repo_name: "dr-snapshots".to_string(),
            peer_host: None,
            peer_repo_dir: None,
        }),
        secondary: Some(RoleConfig {
            install_dir: PathBuf::from("/usr/share/searchd"),
            repo_dir: PathBuf::from("/mnt/snapshots"),
            api_url: "http://127.0.0.1:9200".to_string(),
            repo_name: "dr-snapshots".to_string(),
            peer_host: Some("dr-primary".to_string()),
            peer_repo_dir: Some(PathBuf::from("/mnt/snapshots")),
        }),
        cleanup: Some(RoleConfig {
            install_dir: PathBuf::from("/usr/share/searchd"),
            repo_dir: PathBuf::from("/mnt/snapshots"),
            api_url: "http://127.0.0.1:9200".to_string(),
            repo_name: "dr-snapshots".to_string(),
            peer_host: None,
            peer_repo_dir: None,
        }),
    };

    // Serialization of the sample config cannot fail
    toml::to_string_pretty(&sample).unwrap_or_default()
}
