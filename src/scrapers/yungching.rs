use crate::models::{ScrapedProperty, Source};
use crate::scrapers::extract::BasicExtractor;
use crate::scrapers::fetch::PageFetcher;
use crate::scrapers::traits::{fetch_and_extract, ListingSource};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// 永慶房仲
pub struct YungchingScraper {
    fetcher: Arc<dyn PageFetcher>,
    extractor: BasicExtractor,
}

impl YungchingScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            fetcher,
            extractor: BasicExtractor::new(Source::Yungching)?,
        })
    }
}

#[async_trait]
impl ListingSource for YungchingScraper {
    fn source(&self) -> Source {
        Source::Yungching
    }

    async fn scrape(&self, region: Option<&str>) -> Result<Vec<ScrapedProperty>> {
        info!("Starting Yungching scrape for region: {}", region.unwrap_or("all"));

        let properties = Vec::new();

        info!("Yungching scrape completed. Found {} properties", properties.len());
        Ok(properties)
    }

    async fn scrape_listing(&self, url: &str) -> Result<ScrapedProperty> {
        fetch_and_extract(Source::Yungching, self.fetcher.as_ref(), &self.extractor, url).await
    }
}
