pub mod browser;
pub mod extract;
pub mod fetch;
pub mod rent591;
pub mod sinyi;
pub mod traits;
pub mod yungching;

pub use browser::BrowserFetcher;
pub use fetch::{HttpFetcher, PageFetcher};
pub use rent591::Rent591Scraper;
pub use sinyi::SinyiScraper;
pub use traits::ListingSource;
pub use yungching::YungchingScraper;

use anyhow::Result;
use std::sync::Arc;

/// One scraper per known provider, sharing a page fetcher
pub fn default_sources(fetcher: Arc<dyn PageFetcher>) -> Result<Vec<Box<dyn ListingSource>>> {
    Ok(vec![
        Box::new(Rent591Scraper::new(Arc::clone(&fetcher))?),
        Box::new(SinyiScraper::new(Arc::clone(&fetcher))?),
        Box::new(YungchingScraper::new(fetcher)?),
    ])
}
