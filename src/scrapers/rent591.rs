use crate::location::parse_location;
use crate::models::{ScrapedProperty, Source};
use crate::scrapers::extract::{
    capture, element_text, first_mentioning, first_text, parse_amount, selector, ListingExtractor,
};
use crate::scrapers::fetch::PageFetcher;
use crate::scrapers::traits::{fetch_and_extract, ListingSource};
use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::info;

lazy_static! {
    static ref ROOMS_RE: Regex = Regex::new(r"(\d+)房").unwrap();
    static ref FLOOR_RE: Regex = Regex::new(r"(\d+)樓").unwrap();
    static ref AGE_RE: Regex = Regex::new(r"(\d+)年").unwrap();
    static ref MRT_NOISE_RE: Regex = Regex::new("捷運|站").unwrap();
}

/// Field extraction for 591 rental detail pages
pub struct Rent591Extractor {
    address: Vec<Selector>,
    price: Vec<Selector>,
    rooms: Vec<Selector>,
    floor: Selector,
    item: Selector,
    info: Selector,
    traffic: Selector,
}

impl Rent591Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            address: vec![
                selector(".address")?,
                selector("[class*=\"address\"]")?,
                selector(".detailInfo .txt")?,
            ],
            price: vec![
                selector(".price")?,
                selector("[class*=\"price\"]")?,
                selector(".money")?,
            ],
            rooms: vec![selector(".type")?, selector("[class*=\"room\"]")?],
            floor: selector(".floor")?,
            item: selector(".item")?,
            info: selector(".item, [class*=\"info\"]")?,
            traffic: selector(".item, [class*=\"traffic\"]")?,
        })
    }

    fn floor_text(&self, document: &Html) -> Option<String> {
        document
            .select(&self.floor)
            .next()
            .map(element_text)
            .or_else(|| first_mentioning(document, &self.item, "樓層"))
    }
}

impl ListingExtractor for Rent591Extractor {
    fn extract_document(&self, url: &str, document: &Html) -> ScrapedProperty {
        let address = first_text(document, &self.address)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        let location = parse_location(&address);

        let price = first_text(document, &self.price)
            .map(|text| parse_amount(&text))
            .unwrap_or(0);

        let rooms = first_text(document, &self.rooms)
            .and_then(|text| capture(&ROOMS_RE, &text).map(|n| format!("{}房", n)));

        let floor = self
            .floor_text(document)
            .and_then(|text| capture(&FLOOR_RE, &text).map(str::to_string));

        let age = first_mentioning(document, &self.info, "屋齡")
            .and_then(|text| capture(&AGE_RE, &text).and_then(|n| n.parse().ok()));

        let has_elevator = first_mentioning(document, &self.info, "電梯")
            .map(|text| text.contains('有') || text.contains('✓'));

        let near_mrt = first_mentioning(document, &self.traffic, "捷運")
            .map(|text| MRT_NOISE_RE.replace_all(&text, "").trim().to_string());

        ScrapedProperty {
            property_url: url.to_string(),
            address,
            city: location.city,
            district: location.district,
            floor,
            price,
            rooms,
            age,
            has_elevator,
            near_mrt,
            source: Source::Rent591.label().to_string(),
            notes: None,
        }
    }
}

/// 591租屋網
pub struct Rent591Scraper {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Rent591Extractor,
}

impl Rent591Scraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            fetcher,
            extractor: Rent591Extractor::new()?,
        })
    }
}

#[async_trait]
impl ListingSource for Rent591Scraper {
    fn source(&self) -> Source {
        Source::Rent591
    }

    async fn scrape(&self, region: Option<&str>) -> Result<Vec<ScrapedProperty>> {
        info!("Starting 591 scrape for region: {}", region.unwrap_or("all"));

        // Search-result crawling needs a logged-in, rate-limited session that
        // this tool does not manage; listings come in one page at a time.
        let properties = Vec::new();

        info!("591 scrape completed. Found {} properties", properties.len());
        Ok(properties)
    }

    async fn scrape_listing(&self, url: &str) -> Result<ScrapedProperty> {
        fetch_and_extract(Source::Rent591, self.fetcher.as_ref(), &self.extractor, url).await
    }
}
