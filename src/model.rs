use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw row record as returned by the backend: user columns plus the
/// bookkeeping fields the feed attaches to every entry.
pub type RowRecord = Value;

/// Column name to cell value mapping submitted by a client when appending.
pub type RowData = Map<String, Value>;

/// Metadata for a remote spreadsheet document, including its worksheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    pub worksheets: Vec<WorksheetInfo>,
}

/// Metadata for a single worksheet within a document.
///
/// `index` is the 1-based position within the parent document; index 1 is
/// the first worksheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetInfo {
    pub index: u32,
    pub id: String,
    pub title: String,
    pub row_count: u32,
    pub col_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}
