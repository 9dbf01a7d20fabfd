//! DOM helpers shared by the per-source extractors.

use crate::models::{ScrapedProperty, Source};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(r"[\d,]+").unwrap();
}

/// Turns a loaded listing page into a record
pub trait ListingExtractor: Send + Sync {
    fn extract_document(&self, url: &str, document: &Html) -> ScrapedProperty;

    fn extract(&self, url: &str, html: &str) -> ScrapedProperty {
        let document = Html::parse_document(html);
        self.extract_document(url, &document)
    }
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid selector '{}': {:?}", css, e))
}

pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Text of the first element matched by the first selector that matches anything
pub fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|sel| document.select(sel).next())
        .map(element_text)
}

/// Text of the first element, in document order, whose text mentions `needle`
pub fn first_mentioning(document: &Html, selector: &Selector, needle: &str) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|text| text.contains(needle))
}

/// First run of digits and thousands separators, e.g. "NT$ 25,000 元/月" -> 25000.
/// Zero when nothing usable is found.
pub fn parse_amount(text: &str) -> i64 {
    AMOUNT_RE
        .find(text)
        .map(|m| m.as_str().replace(',', ""))
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// First capture group of `re` in `text`
pub fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Address and price only, for sites whose detail pages expose nothing else reliably
pub struct BasicExtractor {
    source: Source,
    address: Selector,
    price: Selector,
}

impl BasicExtractor {
    pub fn new(source: Source) -> Result<Self> {
        Ok(Self {
            source,
            address: selector(".address, [class*=\"address\"]")?,
            price: selector(".price, [class*=\"price\"]")?,
        })
    }
}

impl ListingExtractor for BasicExtractor {
    fn extract_document(&self, url: &str, document: &Html) -> ScrapedProperty {
        let address = document
            .select(&self.address)
            .next()
            .map(|el| element_text(el).trim().to_string())
            .unwrap_or_default();
        let price = document
            .select(&self.price)
            .next()
            .map(|el| parse_amount(&element_text(el)))
            .unwrap_or(0);

        ScrapedProperty {
            property_url: url.to_string(),
            address,
            price,
            source: self.source.label().to_string(),
            ..Default::default()
        }
    }
}
