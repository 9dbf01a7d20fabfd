use crate::models::{ScrapedProperty, Source};
use crate::scrapers::extract::ListingExtractor;
use crate::scrapers::fetch::PageFetcher;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// One rental listing provider
#[async_trait]
pub trait ListingSource: Send + Sync {
    fn source(&self) -> Source;

    /// Crawl the provider's search results, optionally narrowed to a region
    async fn scrape(&self, region: Option<&str>) -> Result<Vec<ScrapedProperty>>;

    /// Fetch and extract a single listing page
    async fn scrape_listing(&self, url: &str) -> Result<ScrapedProperty>;
}

pub(crate) fn check_url(source: Source, url: &str) -> Result<()> {
    if !url.contains(source.host()) {
        anyhow::bail!("URL {} does not belong to {} ({})", url, source.label(), source.host());
    }
    Ok(())
}

pub(crate) async fn fetch_and_extract(
    source: Source,
    fetcher: &dyn PageFetcher,
    extractor: &dyn ListingExtractor,
    url: &str,
) -> Result<ScrapedProperty> {
    check_url(source, url)?;

    let html = fetcher.fetch(url).await?;
    let property = extractor.extract(url, &html);
    debug!("{}: extracted {:?}", source, property);
    Ok(property)
}
