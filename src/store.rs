use async_trait::async_trait;

use crate::{
    error::Result,
    types::{FileContent, RemoteEntry},
};

/// Read-only access to a hierarchical remote file store
///
/// Identifiers are opaque to the crawler: they are produced by
/// `list_children` and handed back unchanged.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List the direct children of a folder
    ///
    /// Returns `CatalogError::NotFound` or `CatalogError::Forbidden` for
    /// folders that are missing or inaccessible, and `Network`/`RateLimited`
    /// for transient failures.
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>>;

    /// Download the whole content of a file
    async fn fetch_content(&self, file_id: &str) -> Result<FileContent>;

    /// Get a human-readable identifier for this store (for logging/debugging)
    fn identifier(&self) -> String;
}
