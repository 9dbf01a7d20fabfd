use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;
use crate::location;

pub mod field;

pub use field::Field;

/// Rental listing provider a record can originate from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Source {
    #[serde(rename = "591")]
    Rent591,
    #[serde(rename = "sinyi")]
    Sinyi,
    #[serde(rename = "yungching")]
    Yungching,
}

impl Source {
    /// Run order used when the caller does not pick sources
    pub const ALL: [Source; 3] = [Source::Rent591, Source::Sinyi, Source::Yungching];

    /// Identifier accepted on the command line
    pub fn id(self) -> &'static str {
        match self {
            Source::Rent591 => "591",
            Source::Sinyi => "sinyi",
            Source::Yungching => "yungching",
        }
    }

    /// Label stored in the `source` column of persisted records
    pub fn label(self) -> &'static str {
        match self {
            Source::Rent591 => "591租屋網",
            Source::Sinyi => "信義房屋",
            Source::Yungching => "永慶房仲",
        }
    }

    pub fn host(self) -> &'static str {
        match self {
            Source::Rent591 => "591.com.tw",
            Source::Sinyi => "sinyi.com.tw",
            Source::Yungching => "yungching.com.tw",
        }
    }

    /// Detect which provider a listing page belongs to
    pub fn for_url(url: &str) -> Option<Source> {
        Source::ALL.into_iter().find(|s| url.contains(s.host()))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.id() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown source '{}' (expected 591, sinyi or yungching)", s))
    }
}

/// A listing as produced by an extractor or a CSV row, before validation.
///
/// Empty strings and a zero price stand for "not found".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedProperty {
    pub property_url: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub floor: Option<String>,
    pub price: i64,
    pub rooms: Option<String>,
    pub age: Option<i32>,
    pub has_elevator: Option<bool>,
    pub near_mrt: Option<String>,
    pub source: String,
    pub notes: Option<String>,
}

impl ScrapedProperty {
    /// Fill in whichever of city/district is empty from the free-text address
    pub fn backfill_location(&mut self) {
        if !self.city.is_empty() && !self.district.is_empty() {
            return;
        }

        let parsed = location::parse_location(&self.address);
        if self.city.is_empty() {
            self.city = parsed.city;
        }
        if self.district.is_empty() {
            self.district = parsed.district;
        }
    }

    /// Required fields that are absent, in column order
    pub fn missing_fields(&self) -> Vec<Field> {
        let mut missing = Vec::new();
        if self.property_url.is_empty() {
            missing.push(Field::PropertyUrl);
        }
        if self.address.is_empty() {
            missing.push(Field::Address);
        }
        if self.city.is_empty() {
            missing.push(Field::City);
        }
        if self.district.is_empty() {
            missing.push(Field::District);
        }
        if self.price <= 0 {
            missing.push(Field::Price);
        }
        missing
    }

    /// Check the persistence invariant and turn the record into an insert
    pub fn validated(self, created_by: Option<i64>) -> Result<NewProperty, RecordError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(RecordError::MissingFields(missing));
        }

        Ok(NewProperty {
            property_url: self.property_url,
            address: self.address,
            city: self.city,
            district: self.district,
            floor: self.floor,
            price: self.price,
            rooms: self.rooms,
            age: self.age,
            has_elevator: self.has_elevator.unwrap_or(false),
            near_mrt: self.near_mrt,
            source: Some(self.source).filter(|s| !s.is_empty()),
            notes: self.notes,
            created_by,
        })
    }
}

/// A validated record ready to be handed to the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub property_url: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub floor: Option<String>,
    pub price: i64,
    pub rooms: Option<String>,
    pub age: Option<i32>,
    pub has_elevator: bool,
    pub near_mrt: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}

/// Persisted property row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub property_url: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub floor: Option<String>,
    pub price: i64,
    pub rooms: Option<String>,
    pub age: Option<i32>,
    pub has_elevator: bool,
    pub near_mrt: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn from_new(id: i64, new: NewProperty, now: DateTime<Utc>) -> Self {
        Self {
            id,
            property_url: new.property_url,
            address: new.address,
            city: new.city,
            district: new.district,
            floor: new.floor,
            price: new.price,
            rooms: new.rooms,
            age: new.age,
            has_elevator: new.has_elevator,
            near_mrt: new.near_mrt,
            source: new.source,
            notes: new.notes,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filters accepted by `PropertyStore::list_properties`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub district: Option<String>,
    /// Inclusive lower bound
    pub min_price: Option<i64>,
    /// Inclusive upper bound
    pub max_price: Option<i64>,
    /// Substring of address, district or nearby MRT
    pub search: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(city) = self.city.as_deref().filter(|c| !c.is_empty()) {
            if property.city != city {
                return false;
            }
        }
        if let Some(district) = self.district.as_deref().filter(|d| !d.is_empty()) {
            if property.district != district {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| property.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| property.price > max) {
            return false;
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let in_mrt = property
                .near_mrt
                .as_deref()
                .is_some_and(|mrt| mrt.contains(term));
            if !property.address.contains(term) && !property.district.contains(term) && !in_mrt {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScrapedProperty {
        ScrapedProperty {
            property_url: "https://rent.591.com.tw/home/123456".to_string(),
            address: "台北市大安區復興南路一段100號".to_string(),
            price: 28000,
            source: Source::Rent591.label().to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn source_parses_ids_case_insensitively() {
        assert_eq!("591".parse::<Source>().unwrap(), Source::Rent591);
        assert_eq!(" Sinyi ".parse::<Source>().unwrap(), Source::Sinyi);
        assert_eq!("YUNGCHING".parse::<Source>().unwrap(), Source::Yungching);
        assert!("hemnet".parse::<Source>().is_err());
    }

    #[test]
    fn source_detected_from_listing_host() {
        assert_eq!(
            Source::for_url("https://rent.591.com.tw/home/1"),
            Some(Source::Rent591)
        );
        assert_eq!(
            Source::for_url("https://www.yungching.com.tw/rent/67890"),
            Some(Source::Yungching)
        );
        assert_eq!(Source::for_url("https://example.com/rent/1"), None);
    }

    #[test]
    fn backfill_only_touches_empty_fields() {
        let mut property = sample();
        property.backfill_location();
        assert_eq!(property.city, "台北市");
        assert_eq!(property.district, "大安區");

        let mut property = sample();
        property.district = "信義區".to_string();
        property.backfill_location();
        assert_eq!(property.city, "台北市");
        assert_eq!(property.district, "信義區");
    }

    #[test]
    fn validation_lists_every_missing_field() {
        let property = ScrapedProperty {
            address: "somewhere".to_string(),
            ..Default::default()
        };
        match property.validated(None) {
            Err(RecordError::MissingFields(fields)) => assert_eq!(
                fields,
                vec![Field::PropertyUrl, Field::City, Field::District, Field::Price]
            ),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn validation_defaults_elevator_and_drops_empty_source() {
        let mut property = sample();
        property.backfill_location();
        property.source.clear();
        let new = property.validated(Some(7)).unwrap();
        assert!(!new.has_elevator);
        assert_eq!(new.source, None);
        assert_eq!(new.created_by, Some(7));
    }

    #[test]
    fn filter_applies_price_bounds_and_search() {
        let mut scraped = sample();
        scraped.backfill_location();
        scraped.near_mrt = Some("捷運大安站".to_string());
        let property = Property::from_new(1, scraped.validated(None).unwrap(), Utc::now());

        let within = PropertyFilter {
            min_price: Some(28000),
            max_price: Some(30000),
            ..Default::default()
        };
        assert!(within.matches(&property));

        let too_cheap = PropertyFilter {
            max_price: Some(27999),
            ..Default::default()
        };
        assert!(!too_cheap.matches(&property));

        let by_mrt = PropertyFilter {
            search: Some("大安站".to_string()),
            ..Default::default()
        };
        assert!(by_mrt.matches(&property));

        let other_city = PropertyFilter {
            city: Some("新北市".to_string()),
            ..Default::default()
        };
        assert!(!other_city.matches(&property));
    }

    #[test]
    fn empty_city_and_district_do_not_filter() {
        let mut scraped = sample();
        scraped.backfill_location();
        let property = Property::from_new(1, scraped.validated(None).unwrap(), Utc::now());

        let blank = PropertyFilter {
            city: Some(String::new()),
            district: Some(String::new()),
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.matches(&property));
    }
}
