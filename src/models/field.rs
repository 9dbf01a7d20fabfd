use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns of a property record, with the two header spellings accepted on import
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    PropertyUrl,
    Address,
    City,
    District,
    Floor,
    Price,
    Rooms,
    Age,
    HasElevator,
    NearMrt,
    Source,
    Notes,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::PropertyUrl,
        Field::Address,
        Field::City,
        Field::District,
        Field::Floor,
        Field::Price,
        Field::Rooms,
        Field::Age,
        Field::HasElevator,
        Field::NearMrt,
        Field::Source,
        Field::Notes,
    ];

    /// Header used by the Chinese-language spreadsheet template
    pub fn zh_header(self) -> &'static str {
        match self {
            Field::PropertyUrl => "公寓網址",
            Field::Address => "地址",
            Field::City => "縣市",
            Field::District => "行政區",
            Field::Floor => "樓層數",
            Field::Price => "租金價格",
            Field::Rooms => "房間數",
            Field::Age => "屋齡",
            Field::HasElevator => "是否有電梯",
            Field::NearMrt => "靠近捷運",
            Field::Source => "來源",
            Field::Notes => "備註",
        }
    }

    /// Header matching the record's JSON field name
    pub fn en_header(self) -> &'static str {
        match self {
            Field::PropertyUrl => "propertyUrl",
            Field::Address => "address",
            Field::City => "city",
            Field::District => "district",
            Field::Floor => "floor",
            Field::Price => "price",
            Field::Rooms => "rooms",
            Field::Age => "age",
            Field::HasElevator => "hasElevator",
            Field::NearMrt => "nearMrt",
            Field::Source => "source",
            Field::Notes => "notes",
        }
    }

    /// Resolve a header cell to a field, if it is one of the known aliases
    pub fn from_header(header: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.zh_header() == header || f.en_header() == header)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.zh_header())
    }
}
