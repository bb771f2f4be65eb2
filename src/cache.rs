use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    error::{CatalogError, Result},
    store::RemoteStore,
    types::{FileContent, RemoteEntry},
};

/// Storage for downloaded file content, keyed by string
#[async_trait]
pub trait Cache: Send + Sync {
    /// Cached bytes for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Remember `value` under `key`
    async fn set(&self, key: &str, value: Bytes) -> Result<()>;
}

/// Keeps downloads on disk so a later crawl can reuse them
///
/// Keys are hashed because file ids may contain characters that are not
/// valid in file names; entries are spread over 256 sub-directories.
pub struct DiskCache {
    root_dir: PathBuf,
}

impl DiskCache {
    pub async fn new(root_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root_dir).await?;
        Ok(Self { root_dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
        let (shard, rest) = digest.split_at(2);
        self.root_dir.join(shard).join(rest)
    }
}

#[async_trait]
impl Cache for DiskCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        match fs::read(self.entry_path(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CatalogError::Cache {
                message: format!("cannot read entry for {}: {}", key, e),
            }),
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves a
    /// truncated entry behind
    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let path = self.entry_path(key);
        let temp = path.with_extension("partial");

        let write = async {
            if let Some(shard) = path.parent() {
                fs::create_dir_all(shard).await?;
            }
            fs::write(&temp, &value).await?;
            fs::rename(&temp, &path).await
        };
        write.await.map_err(|e| CatalogError::Cache {
            message: format!("cannot write entry for {}: {}", key, e),
        })
    }
}

/// Cache that never holds anything; every fetch reaches the store
pub struct NoCache;

#[async_trait]
impl Cache for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Bytes) -> Result<()> {
        Ok(())
    }
}

/// Store decorator that serves file content from a cache
///
/// Folder listings always go to the inner store so new files are seen;
/// only `fetch_content` is cached.
pub struct CachedStore<S> {
    inner: S,
    cache: Arc<dyn Cache>,
}

impl<S: RemoteStore> CachedStore<S> {
    pub fn new(inner: S, cache: Arc<dyn Cache>) -> Self {
        Self { inner, cache }
    }

    fn cache_key(file_id: &str) -> String {
        format!("content:{}", file_id)
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for CachedStore<S> {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>> {
        self.inner.list_children(folder_id).await
    }

    async fn fetch_content(&self, file_id: &str) -> Result<FileContent> {
        let key = Self::cache_key(file_id);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                debug!(file = file_id, "content served from cache");
                return Ok(FileContent {
                    content: cached,
                    source: format!("cache:{}", file_id),
                });
            }
            Ok(None) => {}
            Err(e) => warn!(file = file_id, error = %e, "cache read failed"),
        }

        let file = self.inner.fetch_content(file_id).await?;
        if let Err(e) = self.cache.set(&key, file.content.clone()).await {
            warn!(file = file_id, error = %e, "cache write failed");
        }
        Ok(file)
    }

    fn identifier(&self) -> String {
        format!("cached+{}", self.inner.identifier())
    }
}
