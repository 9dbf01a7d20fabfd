//! Per-record failures.
//!
//! These never abort a batch: the importer and the collector count them and
//! keep going. The `Display` text is what ends up in user-facing error lists.

use crate::models::Field;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("缺少必填欄位：{}", join_fields(.0))]
    MissingFields(Vec<Field>),

    #[error("欄位「{field}」不是有效的整數：{value}")]
    InvalidNumber { field: Field, value: String },

    #[error("物件已存在：{url}")]
    Duplicate { url: String },

    #[error("寫入資料庫失敗：{0:#}")]
    Store(anyhow::Error),

    #[error("無法讀取既有物件：{0}")]
    Lookup(String),
}

impl RecordError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RecordError::Duplicate { .. })
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.zh_header())
        .collect::<Vec<_>>()
        .join("、")
}
