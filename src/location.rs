//! Best-effort split of a Taiwanese address into city/county and district.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Municipalities and counties, in match priority order
pub const CITIES: [&str; 22] = [
    "台北市", "新北市", "桃園市", "台中市", "台南市", "高雄市",
    "基隆市", "新竹市", "嘉義市", "新竹縣", "苗栗縣", "彰化縣",
    "南投縣", "雲林縣", "嘉義縣", "屏東縣", "宜蘭縣", "花蓮縣",
    "台東縣", "澎湖縣", "金門縣", "連江縣",
];

lazy_static! {
    // Shortest run free of ASCII digits ending in a district/township/city
    // marker. Full-width digits are ordinary text here.
    static ref DISTRICT_RE: Regex = Regex::new(r"^([^0-9]+?[區鄉鎮市])").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLocation {
    pub city: String,
    pub district: String,
}

/// First known city found anywhere in `address`, plus the district that
/// immediately follows it. Both are empty when no city matches.
pub fn parse_location(address: &str) -> ParsedLocation {
    let Some(city) = CITIES.iter().find(|c| address.contains(**c)) else {
        return ParsedLocation::default();
    };

    let district = address
        .find(city)
        .map(|pos| &address[pos + city.len()..])
        .and_then(|rest| DISTRICT_RE.captures(rest))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    ParsedLocation {
        city: city.to_string(),
        district,
    }
}
