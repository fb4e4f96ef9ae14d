//! The adapter between HTTP requests and the spreadsheet backend.
//!
//! Each operation performs one credential handshake followed by one backend
//! round trip, normalizes row payloads, and shapes every backend failure
//! into the uniform [`ApiError::BadRequest`].

use crate::backend::SpreadsheetBackend;
use crate::error::ApiError;
use crate::model::{DocumentInfo, RowData, RowRecord, WorksheetInfo};
use crate::normalize::{normalize_row, normalize_rows};
use std::sync::Arc;

/// Worksheet used when a request does not name one. Index 1 is the first
/// worksheet of the document.
pub const DEFAULT_WORKSHEET_INDEX: u32 = 1;

pub struct SheetService {
    backend: Arc<dyn SpreadsheetBackend>,
}

impl SheetService {
    pub fn new(backend: Arc<dyn SpreadsheetBackend>) -> Self {
        Self { backend }
    }

    /// Fetches document metadata, worksheet collection included, unmodified.
    pub async fn document_info(&self, sheet_id: &str) -> Result<DocumentInfo, ApiError> {
        let auth = self.backend.authenticate().await?;
        Ok(self.backend.document_info(&auth, sheet_id).await?)
    }

    /// Fetches metadata for the worksheet at `sheet_index` (1-based,
    /// defaults to the first worksheet).
    pub async fn worksheet_info(
        &self,
        sheet_id: &str,
        sheet_index: Option<&str>,
    ) -> Result<WorksheetInfo, ApiError> {
        let index = resolve_index("worksheet", sheet_index)?;
        let info = self.document_info(sheet_id).await?;
        info.worksheets
            .into_iter()
            .nth(index as usize - 1)
            .ok_or_else(|| ApiError::not_found(format!("worksheet {index} does not exist")))
    }

    /// Fetches all rows of the worksheet, normalized, in backend order.
    pub async fn rows(
        &self,
        sheet_id: &str,
        sheet_index: Option<&str>,
    ) -> Result<Vec<RowRecord>, ApiError> {
        let index = resolve_index("worksheet", sheet_index)?;
        let auth = self.backend.authenticate().await?;
        let rows = self.backend.rows(&auth, sheet_id, index).await?;
        Ok(normalize_rows(rows))
    }

    /// Fetches the row at `row_index` (1-based), normalized.
    ///
    /// The backend has no single-row read, so the entire row set is
    /// retrieved and indexed locally.
    pub async fn row(
        &self,
        sheet_id: &str,
        row_index: &str,
        sheet_index: Option<&str>,
    ) -> Result<RowRecord, ApiError> {
        let row = resolve_index("row", Some(row_index))?;
        let index = resolve_index("worksheet", sheet_index)?;
        let auth = self.backend.authenticate().await?;
        let rows = self.backend.rows(&auth, sheet_id, index).await?;
        let record = rows
            .into_iter()
            .nth(row as usize - 1)
            .ok_or_else(|| ApiError::not_found(format!("row {row} does not exist")))?;
        Ok(normalize_row(record))
    }

    /// Appends `row_data` as a new row and echoes the submitted data back
    /// verbatim. The response acknowledges the request; it is not a
    /// representation of the stored row.
    pub async fn append_row(
        &self,
        sheet_id: &str,
        row_data: RowData,
        sheet_index: Option<&str>,
    ) -> Result<RowData, ApiError> {
        let index = resolve_index("worksheet", sheet_index)?;
        let auth = self.backend.authenticate().await?;
        self.backend
            .append_row(&auth, sheet_id, index, &row_data)
            .await?;
        Ok(row_data)
    }
}

/// Parses a raw path parameter into a 1-based index. The router forwards
/// parameters verbatim; unusable values fail here.
fn resolve_index(kind: &str, raw: Option<&str>) -> Result<u32, ApiError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_WORKSHEET_INDEX);
    };
    match raw.trim().parse::<u32>() {
        Ok(index) if index >= 1 => Ok(index),
        _ => Err(ApiError::invalid_param(format!(
            "{kind} index must be a positive integer, got {raw:?}"
        ))),
    }
}
