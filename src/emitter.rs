use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::{error::Result, types::Catalog};

/// Destination for a finished catalog
#[async_trait]
pub trait CatalogSink: Send + Sync {
    async fn accept(&self, catalog: &Catalog) -> Result<()>;
}

/// Serialize a catalog as a JSON array indented by four spaces
pub fn to_json(catalog: &Catalog) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    catalog.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

/// Writes the catalog to a JSON file
///
/// The document is written next to the target and renamed into place, so
/// readers never observe a half-written catalog.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CatalogSink for JsonFileSink {
    async fn accept(&self, catalog: &Catalog) -> Result<()> {
        let json = to_json(catalog)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, &json).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// Keeps the most recently accepted catalog in memory
#[derive(Default)]
pub struct MemorySink {
    last: Mutex<Option<Catalog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn last(&self) -> Option<Catalog> {
        self.last.lock().await.clone()
    }
}

#[async_trait]
impl CatalogSink for MemorySink {
    async fn accept(&self, catalog: &Catalog) -> Result<()> {
        *self.last.lock().await = Some(catalog.clone());
        Ok(())
    }
}
