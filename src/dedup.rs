use crate::error::RecordError;
use crate::models::{NewProperty, Property};
use crate::store::PropertyStore;
use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::debug;

/// Whether a record with exactly this URL is already persisted.
///
/// Reads every stored URL, so only use it for one-off checks.
pub async fn property_exists(store: &dyn PropertyStore, url: &str) -> Result<bool> {
    let urls = store.property_urls().await?;
    Ok(urls.iter().any(|u| u == url))
}

/// URL gate for one import batch.
///
/// Persisted URLs are loaded once when the batch starts; every URL accepted
/// during the batch is remembered, so two new rows sharing a URL are caught
/// against each other as well.
#[derive(Debug, Default)]
pub struct Deduplicator {
    known: HashSet<String>,
}

impl Deduplicator {
    pub async fn load(store: &dyn PropertyStore) -> Result<Self> {
        let known: HashSet<String> = store
            .property_urls()
            .await
            .context("Failed to load existing property URLs")?
            .into_iter()
            .collect();

        debug!("Loaded {} existing property URLs", known.len());
        Ok(Self { known })
    }

    pub fn is_duplicate(&self, url: &str) -> bool {
        self.known.contains(url)
    }

    /// Record a URL that was just persisted
    pub fn remember(&mut self, url: impl Into<String>) {
        self.known.insert(url.into());
    }

    /// Persist `property` unless its URL is already known, then remember it.
    ///
    /// Check and insert are not atomic; a batch must be the only writer.
    pub async fn insert_new(
        &mut self,
        store: &dyn PropertyStore,
        property: NewProperty,
    ) -> Result<Property, RecordError> {
        if self.is_duplicate(&property.property_url) {
            return Err(RecordError::Duplicate {
                url: property.property_url,
            });
        }

        let url = property.property_url.clone();
        let row = store
            .create_property(property)
            .await
            .map_err(RecordError::Store)?;
        self.remember(url);
        Ok(row)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
