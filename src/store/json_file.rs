use crate::models::{NewProperty, Property, PropertyFilter};
use crate::store::{MemoryStore, PropertyStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Store backed by a pretty-printed JSON array on disk.
///
/// The whole file is rewritten after every insert.
pub struct JsonFileStore {
    path: PathBuf,
    rows: MemoryStore,
}

impl JsonFileStore {
    /// Load the store file, starting empty if it does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let rows: Vec<Property> = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse store file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No store at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read store file {}", path.display()))
            }
        };

        debug!("Loaded {} properties from {}", rows.len(), path.display());
        Ok(Self {
            path,
            rows: MemoryStore::with_rows(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<()> {
        let mut rows = self.rows.snapshot().await;
        rows.sort_by_key(|p| p.id);
        let json = serde_json::to_string_pretty(&rows)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write store file {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl PropertyStore for JsonFileStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>> {
        self.rows.list_properties(filter).await
    }

    async fn create_property(&self, property: NewProperty) -> Result<Property> {
        let row = self.rows.create_property(property).await?;
        if let Err(e) = self.save().await {
            warn!("Rolling back property {}: {:#}", row.id, e);
            self.rows.remove(row.id).await;
            return Err(e);
        }
        Ok(row)
    }
}
