//! Bulk import of comma-separated listing rows.
//!
//! The first non-blank line is the header. Cells are split on every comma:
//! there is no quoting, so a value containing a comma shifts the columns
//! after it.

use crate::dedup::Deduplicator;
use crate::error::RecordError;
use crate::models::{Field, ScrapedProperty};
use crate::store::PropertyStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Source label for rows whose source column is empty
pub const DEFAULT_SOURCE: &str = "CSV匯入";

const DELIMITER: char = ',';

/// "Has an elevator" tokens, one per header language
const ELEVATOR_YES_ZH: &str = "是";
const ELEVATOR_YES_EN: &str = "true";

/// Outcome of one import, in the shape the admin page displays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success: usize,
    pub errors: usize,
    pub error_messages: Vec<String>,
}

impl ImportReport {
    fn record_error(&mut self, line: u64, err: &RecordError) {
        warn!("Line {} rejected: {}", line, err);
        self.errors += 1;
        self.error_messages.push(format!("第 {} 行：{}", line, err));
    }
}

/// A data row with its 1-based line number
#[derive(Debug)]
pub struct CsvRow {
    pub line: u64,
    pub cells: HashMap<String, String>,
}

impl CsvRow {
    /// Value of `field`, preferring the Chinese header over the English one
    pub fn get(&self, field: Field) -> Option<&str> {
        self.cell(field.zh_header())
            .or_else(|| self.cell(field.en_header()))
    }

    fn cell(&self, header: &str) -> Option<&str> {
        self.cells
            .get(header)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Each elevator column is checked against its own token and either
    /// one may switch the flag on. `None` when both are absent.
    fn has_elevator(&self) -> Option<bool> {
        let zh = self.cell(Field::HasElevator.zh_header());
        let en = self.cell(Field::HasElevator.en_header());
        if zh.is_none() && en.is_none() {
            return None;
        }
        Some(zh == Some(ELEVATOR_YES_ZH) || en == Some(ELEVATOR_YES_EN))
    }

    /// Map the row onto a record. Missing required fields are left empty
    /// for `ScrapedProperty::validated` to report.
    pub fn to_property(&self) -> Result<ScrapedProperty, RecordError> {
        let text = |field: Field| self.get(field).unwrap_or_default().to_string();
        let optional = |field: Field| self.get(field).map(str::to_string);

        let mut property = ScrapedProperty {
            property_url: text(Field::PropertyUrl),
            address: text(Field::Address),
            city: text(Field::City),
            district: text(Field::District),
            floor: optional(Field::Floor),
            // Non-numeric rent counts as no rent.
            price: self.get(Field::Price).and_then(leading_int).unwrap_or(0),
            rooms: optional(Field::Rooms),
            age: None,
            has_elevator: self.has_elevator(),
            near_mrt: optional(Field::NearMrt),
            source: self.get(Field::Source).unwrap_or(DEFAULT_SOURCE).to_string(),
            notes: optional(Field::Notes),
        };

        if let Some(value) = self.get(Field::Age) {
            match leading_int(value).and_then(|n| i32::try_from(n).ok()) {
                Some(age) => property.age = Some(age),
                None if property.missing_fields().is_empty() => {
                    return Err(RecordError::InvalidNumber {
                        field: Field::Age,
                        value: value.to_string(),
                    })
                }
                None => {}
            }
        }

        Ok(property)
    }
}

/// Integer prefix of `value`, e.g. "20000元" -> 20000
fn leading_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let digits_from = usize::from(value.starts_with(['-', '+']));
    let end = value[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| i + digits_from)
        .unwrap_or(value.len());
    if end == digits_from {
        return None;
    }
    value[..end].parse().ok()
}

/// Split `text` into header-keyed rows, skipping blank lines
pub fn parse_rows(text: &str) -> Vec<CsvRow> {
    let text = text.trim_start_matches('\u{feff}');
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<&str> = header_line.split(DELIMITER).map(str::trim).collect();
    for header in headers.iter().filter(|h| Field::from_header(h).is_none()) {
        debug!("Ignoring unknown column '{}'", header);
    }

    lines
        .map(|(index, line)| CsvRow {
            line: index as u64 + 1,
            cells: headers
                .iter()
                .zip(line.split(DELIMITER).map(str::trim))
                .map(|(header, value)| (header.to_string(), value.to_string()))
                .collect(),
        })
        .collect()
}

/// Import every data row of `text`, persisting the valid, previously unseen
/// ones. Rows are handled in file order and a bad row never stops the rest;
/// rows inserted before a failure stay inserted.
pub async fn import_csv(
    store: &dyn PropertyStore,
    text: &str,
    user_id: Option<i64>,
) -> ImportReport {
    let mut report = ImportReport::default();

    let rows = parse_rows(text);

    if rows.is_empty() {
        info!("CSV import: no data rows");
        return report;
    }

    let mut dedup = match Deduplicator::load(store).await {
        Ok(dedup) => dedup,
        Err(e) => {
            let err = RecordError::Lookup(format!("{:#}", e));
            for row in &rows {
                report.record_error(row.line, &err);
            }
            return report;
        }
    };

    debug!("{} rows to import, {} URLs already known", rows.len(), dedup.len());

    for row in &rows {
        let outcome = match row.to_property().and_then(|p| p.validated(user_id)) {
            Ok(property) => dedup.insert_new(store, property).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(saved) => {
                debug!("Line {} saved as property {}", row.line, saved.id);
                report.success += 1;
            }
            Err(err) => report.record_error(row.line, &err),
        }
    }

    info!(
        "CSV import completed. Success: {}, Errors: {}",
        report.success, report.errors
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyFilter;
    use crate::store::testing::FailingStore;
    use crate::store::MemoryStore;

    const HEADER: &str = "公寓網址,地址,縣市,行政區,租金價格";

    #[test]
    fn leading_int_mimics_lenient_parsing() {
        assert_eq!(leading_int("20000"), Some(20000));
        assert_eq!(leading_int(" 20000元 "), Some(20000));
        assert_eq!(leading_int("-3"), Some(-3));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int(""), None);
    }

    #[test]
    fn rows_carry_physical_line_numbers() {
        let rows = parse_rows("a,b\n1,2\n\n3,4\n");
        let lines: Vec<u64> = rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(rows[1].cells.get("b").map(String::as_str), Some("4"));
    }

    #[test]
    fn english_headers_and_optional_fields() {
        let rows = parse_rows(
            "propertyUrl,address,city,district,floor,price,rooms,age,hasElevator,nearMrt,source,notes\n\
             http://x/9, 台北市信義區松仁路100號 ,台北市,信義區,10/20,35000,2房2廳1衛,8,true,捷運市政府站,永慶房仲,近商圈",
        );
        let property = rows[0].to_property().unwrap();

        assert_eq!(property.address, "台北市信義區松仁路100號");
        assert_eq!(property.floor.as_deref(), Some("10/20"));
        assert_eq!(property.price, 35000);
        assert_eq!(property.age, Some(8));
        assert_eq!(property.has_elevator, Some(true));
        assert_eq!(property.source, "永慶房仲");
        assert_eq!(property.notes.as_deref(), Some("近商圈"));
    }

    #[test]
    fn chinese_header_wins_over_english() {
        let rows = parse_rows("地址,address,是否有電梯\n甲,乙,否\n,乙,是");
        assert_eq!(rows[0].get(Field::Address), Some("甲"));
        assert_eq!(rows[1].get(Field::Address), Some("乙"));
        assert_eq!(rows[0].to_property().unwrap().has_elevator, Some(false));
        assert_eq!(rows[1].to_property().unwrap().has_elevator, Some(true));
    }

    #[test]
    fn elevator_columns_are_checked_independently() {
        let rows = parse_rows("是否有電梯,hasElevator,地址\n否,true,a\n是,false,b\ntrue,,c\n,是,d\n,,e");
        let flags: Vec<Option<bool>> = rows
            .iter()
            .map(|row| row.to_property().unwrap().has_elevator)
            .collect();
        assert_eq!(
            flags,
            vec![Some(true), Some(true), Some(false), Some(false), None]
        );
    }

    #[test]
    fn non_numeric_age_is_a_typed_error() {
        let rows = parse_rows(&format!("{},屋齡\nhttp://x/1,台北市大安區1號,台北市,大安區,20000,新成屋", HEADER));
        match rows[0].to_property() {
            Err(RecordError::InvalidNumber { field, value }) => {
                assert_eq!(field, Field::Age);
                assert_eq!(value, "新成屋");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn single_valid_row_is_persisted() {
        let store = MemoryStore::new();
        let report = import_csv(
            &store,
            "公寓網址,地址,縣市,行政區,租金價格\nhttp://x/1,台北市大安區1號,台北市,大安區,20000",
            None,
        )
        .await;

        assert_eq!(
            report,
            ImportReport {
                success: 1,
                errors: 0,
                error_messages: vec![],
            }
        );
        let saved = store.snapshot().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].price, 20000);
        assert_eq!(saved[0].source.as_deref(), Some(DEFAULT_SOURCE));
        assert!(!saved[0].has_elevator);
    }

    #[tokio::test]
    async fn repeated_url_in_one_file_is_rejected() {
        let store = MemoryStore::new();
        let row = "http://x/1,台北市大安區1號,台北市,大安區,20000";
        let report = import_csv(&store, &format!("{}\n{}\n{}", HEADER, row, row), Some(5)).await;

        assert_eq!(report.success, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(report.error_messages, vec!["第 3 行：物件已存在：http://x/1"]);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.snapshot().await[0].created_by, Some(5));
    }

    #[tokio::test]
    async fn reimport_reports_every_row_as_duplicate() {
        let store = MemoryStore::new();
        let csv = format!(
            "{}\nhttp://x/1,台北市大安區1號,台北市,大安區,20000\nhttp://x/2,新北市板橋區2號,新北市,板橋區,18000\n",
            HEADER
        );

        let first = import_csv(&store, &csv, None).await;
        assert_eq!((first.success, first.errors), (2, 0));

        let second = import_csv(&store, &csv, None).await;
        assert_eq!((second.success, second.errors), (0, 2));
        assert!(second.error_messages.iter().all(|m| m.contains("物件已存在")));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn rows_missing_required_fields_are_rejected() {
        let store = MemoryStore::new();
        let csv = format!(
            "{}\n\
             ,台北市大安區1號,台北市,大安區,20000\n\
             http://x/2,,台北市,大安區,20000\n\
             http://x/3,台北市大安區3號,,大安區,20000\n\
             http://x/4,台北市大安區4號,台北市,,20000\n\
             http://x/5,台北市大安區5號,台北市,大安區,\n\
             http://x/6,台北市大安區6號,台北市,大安區,0\n\
             http://x/7,台北市大安區7號,台北市,大安區,面議\n\
             http://x/8,台北市大安區8號,台北市,大安區,20000",
            HEADER
        );

        let report = import_csv(&store, &csv, None).await;
        assert_eq!(report.success, 1);
        assert_eq!(report.errors, 7);
        assert_eq!(report.success + report.errors, 8);
        assert_eq!(report.error_messages[0], "第 2 行：缺少必填欄位：公寓網址");
        assert_eq!(report.error_messages[4], "第 6 行：缺少必填欄位：租金價格");
        assert!(report.error_messages[6].starts_with("第 8 行："));

        let saved = store.list_properties(&PropertyFilter::default()).await.unwrap();
        assert_eq!(saved[0].property_url, "http://x/8");
    }

    #[tokio::test]
    async fn missing_fields_take_precedence_over_bad_age() {
        let store = MemoryStore::new();
        let report = import_csv(
            &store,
            "公寓網址,地址,縣市,行政區,租金價格,屋齡\nhttp://x/1,台北市大安區1號,,大安區,20000,abc",
            None,
        )
        .await;
        assert_eq!(report.error_messages, vec!["第 2 行：缺少必填欄位：縣市"]);
    }

    #[tokio::test]
    async fn short_rows_and_extra_columns_are_tolerated() {
        let store = MemoryStore::new();
        let report = import_csv(
            &store,
            "公寓網址,地址,縣市,行政區,租金價格,未知欄位\n\
             http://x/1,台北市大安區1號,台北市,大安區,20000,ignored,extra\n\
             http://x/2,台北市大安區2號",
            None,
        )
        .await;
        assert_eq!((report.success, report.errors), (1, 1));
        assert_eq!(report.error_messages, vec!["第 3 行：缺少必填欄位：縣市、行政區、租金價格"]);
    }

    #[tokio::test]
    async fn header_only_input_imports_nothing() {
        let store = MemoryStore::new();
        assert_eq!(import_csv(&store, HEADER, None).await, ImportReport::default());
        assert_eq!(import_csv(&store, "", None).await, ImportReport::default());
    }

    #[tokio::test]
    async fn byte_order_mark_and_crlf_are_handled() {
        let store = MemoryStore::new();
        let report = import_csv(
            &store,
            "\u{feff}公寓網址,地址,縣市,行政區,租金價格\r\nhttp://x/1,台北市大安區1號,台北市,大安區,20000\r\n",
            None,
        )
        .await;
        assert_eq!((report.success, report.errors), (1, 0));
    }

    #[tokio::test]
    async fn rejected_write_is_reported_and_the_batch_continues() {
        let store = FailingStore::default().rejecting("http://x/1");
        let csv = format!(
            "{}\nhttp://x/1,台北市大安區1號,台北市,大安區,20000\n\
             http://x/2,台北市大安區2號,台北市,大安區,21000\n\
             http://x/1,台北市大安區1號,台北市,大安區,20000",
            HEADER
        );

        let report = import_csv(&store, &csv, None).await;
        assert_eq!(
            report,
            ImportReport {
                success: 1,
                errors: 2,
                error_messages: vec![
                    "第 2 行：寫入資料庫失敗：disk full".to_string(),
                    "第 4 行：寫入資料庫失敗：disk full".to_string(),
                ],
            }
        );
        let saved = store.rows.snapshot().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].property_url, "http://x/2");
    }

    #[tokio::test]
    async fn unreadable_store_fails_every_row() {
        let store = FailingStore::default().unreadable();
        let csv = format!(
            "{}\nhttp://x/1,台北市大安區1號,台北市,大安區,20000\n\nhttp://x/2,台北市大安區2號,台北市,大安區,21000",
            HEADER
        );

        let report = import_csv(&store, &csv, None).await;
        assert_eq!((report.success, report.errors), (0, 2));
        assert!(report.error_messages[0].starts_with("第 2 行：無法讀取既有物件："));
        assert!(report.error_messages[1].starts_with("第 4 行：無法讀取既有物件："));
        assert!(report.error_messages[0].contains("connection refused"));
        assert!(store.rows.snapshot().await.is_empty());
    }
}
