//! Index Administration Client
//!
//! Operations the reconciliation engine performs against the search
//! engine's administration HTTP API: repository registration, index
//! open/close, index-lifecycle start/stop, snapshot deletion and index
//! catalog listing.

pub mod http;

pub use http::HttpAdminClient;

use std::path::Path;

use crate::error::Result;

/// Catch-all index pattern, including hidden and system indices
pub const ALL_INDICES_PATTERN: &str = "*";

/// Interface to the index-administration API.
///
/// Every mutating call requires an acknowledgement from the API; a
/// response without one fails the call.
#[async_trait::async_trait]
pub trait AdminClient: Send + Sync {
    /// Create or update the filesystem snapshot repository
    async fn register_repository(&self, repo: &str, location: &Path, readonly: bool)
        -> Result<()>;

    /// Close an index so a restore cannot collide with open handles
    async fn close_index(&self, index: &str) -> Result<()>;

    /// Re-open a closed index (operator escape hatch; the restore itself
    /// re-opens what it restores)
    async fn open_index(&self, index: &str) -> Result<()>;

    /// Resume index-lifecycle management
    async fn ilm_start(&self) -> Result<()>;

    /// Pause index-lifecycle management
    async fn ilm_stop(&self) -> Result<()>;

    /// Delete a named snapshot from a named repository
    async fn delete_snapshot(&self, repo: &str, snapshot: &str) -> Result<()>;

    /// List index names matching a pattern, hidden indices included
    async fn list_indices(&self, pattern: &str) -> Result<Vec<String>>;
}
