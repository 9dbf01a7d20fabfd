//! Runs the listing sources and the importers against one store.

use crate::dedup::{self, Deduplicator};
use crate::error::RecordError;
use crate::importer::{self, ImportReport};
use crate::models::{Property, ScrapedProperty, Source};
use crate::scrapers::ListingSource;
use crate::store::PropertyStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Counts reported by a scrape run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub new: usize,
    pub duplicate: usize,
    pub errors: usize,
}

/// What happened to a single listing page sent in for import
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ListingOutcome {
    Created { property: Property },
    Duplicate { url: String },
}

pub struct Collector {
    store: Arc<dyn PropertyStore>,
    sources: Vec<Box<dyn ListingSource>>,
}

impl Collector {
    pub fn new(store: Arc<dyn PropertyStore>, sources: Vec<Box<dyn ListingSource>>) -> Self {
        Self { store, sources }
    }

    pub fn store(&self) -> &dyn PropertyStore {
        self.store.as_ref()
    }

    fn source(&self, source: Source) -> Option<&dyn ListingSource> {
        self.sources
            .iter()
            .find(|s| s.source() == source)
            .map(|s| s.as_ref())
    }

    /// Scrape `sources` one after another (all of them when empty) and
    /// persist every new record.
    ///
    /// A failing source or record is counted and skipped; nothing aborts the run.
    pub async fn run_import(
        &self,
        sources: &[Source],
        region: Option<&str>,
        user_id: Option<i64>,
    ) -> RunSummary {
        let all = Source::ALL;
        let sources = if sources.is_empty() { &all[..] } else { sources };
        let ids: Vec<&str> = sources.iter().map(|s| s.id()).collect();
        info!("Starting scrape job for sources: {}", ids.join(", "));

        let mut summary = RunSummary::default();
        let mut gate: Option<Deduplicator> = None;

        for &source in sources {
            let Some(scraper) = self.source(source) else {
                error!("No scraper registered for {}", source);
                summary.errors += 1;
                continue;
            };

            let properties = match scraper.scrape(region).await {
                Ok(properties) => properties,
                Err(e) => {
                    error!("Error scraping {}: {:#}", source, e);
                    summary.errors += 1;
                    continue;
                }
            };

            summary.total += properties.len();

            for property in properties {
                let url = property.property_url.clone();
                match self.save(&mut gate, property, user_id).await {
                    Ok(saved) => {
                        debug!("Saved {} as property {}", url, saved.id);
                        summary.new += 1;
                    }
                    Err(e) if e.is_duplicate() => {
                        debug!("Skipping duplicate {}", url);
                        summary.duplicate += 1;
                    }
                    Err(e) => {
                        error!("Error saving property {}: {}", url, e);
                        summary.errors += 1;
                    }
                }
            }
        }

        info!(
            "Scrape job completed. Total: {}, New: {}, Duplicates: {}, Errors: {}",
            summary.total, summary.new, summary.duplicate, summary.errors
        );
        summary
    }

    /// Backfill, validate and insert one scraped record. The URL gate is
    /// loaded on first use so a run with nothing to save never reads the store.
    async fn save(
        &self,
        gate: &mut Option<Deduplicator>,
        mut property: ScrapedProperty,
        user_id: Option<i64>,
    ) -> Result<Property, RecordError> {
        property.backfill_location();
        let property = property.validated(user_id)?;

        let loaded = match gate.take() {
            Some(dedup) => dedup,
            None => Deduplicator::load(self.store())
                .await
                .map_err(|e| RecordError::Lookup(format!("{:#}", e)))?,
        };
        gate.insert(loaded).insert_new(self.store(), property).await
    }

    /// Import delimited text; see [`importer::import_csv`]
    pub async fn import_csv(&self, text: &str, user_id: Option<i64>) -> ImportReport {
        importer::import_csv(self.store(), text, user_id).await
    }

    /// Fetch one listing page, extract it with the matching source and store it
    pub async fn import_listing(&self, url: &str, user_id: Option<i64>) -> Result<ListingOutcome> {
        let source = Source::for_url(url)
            .with_context(|| format!("No known rental site matches {}", url))?;
        let scraper = self
            .source(source)
            .with_context(|| format!("No scraper registered for {}", source))?;

        let mut property = scraper
            .scrape_listing(url)
            .await
            .with_context(|| format!("Failed to extract listing {}", url))?;
        property.backfill_location();
        let property = property.validated(user_id)?;

        if dedup::property_exists(self.store(), &property.property_url).await? {
            warn!("{} is already stored", property.property_url);
            return Ok(ListingOutcome::Duplicate {
                url: property.property_url,
            });
        }

        let saved = self.store.create_property(property).await?;
        info!("Saved {} as property {}", saved.property_url, saved.id);
        Ok(ListingOutcome::Created { property: saved })
    }
}
