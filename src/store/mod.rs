use crate::models::{NewProperty, Property, PropertyFilter};
use anyhow::Result;
use async_trait::async_trait;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Persistence collaborator for property records
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Records matching `filter`, newest first
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>>;

    /// Insert a validated record; the store assigns id and timestamps
    async fn create_property(&self, property: NewProperty) -> Result<Property>;

    async fn property_urls(&self) -> Result<Vec<String>> {
        let all = self.list_properties(&PropertyFilter::default()).await?;
        Ok(all.into_iter().map(|p| p.property_url).collect())
    }

    /// Distinct cities, sorted
    async fn cities(&self) -> Result<Vec<String>> {
        let all = self.list_properties(&PropertyFilter::default()).await?;
        let mut cities: Vec<String> = all.into_iter().map(|p| p.city).collect();
        cities.sort();
        cities.dedup();
        Ok(cities)
    }

    /// Distinct districts of one city, sorted
    async fn districts(&self, city: &str) -> Result<Vec<String>> {
        let filter = PropertyFilter {
            city: Some(city.to_string()),
            ..Default::default()
        };
        let mut districts: Vec<String> = self
            .list_properties(&filter)
            .await?
            .into_iter()
            .map(|p| p.district)
            .collect();
        districts.sort();
        districts.dedup();
        Ok(districts)
    }
}
