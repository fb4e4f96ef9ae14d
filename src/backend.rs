//! Client for the remote spreadsheet service.
//!
//! The service is reached through [`SpreadsheetBackend`], a capability-style
//! seam: every operation first performs a credential handshake, then issues
//! exactly one HTTP round trip. [`GoogleSheetsClient`] implements the trait
//! against the Google Spreadsheets private feeds (worksheets feed for
//! document metadata, list feed for row data).

use crate::config::ServerConfig;
use crate::model::{DocumentInfo, RowData, RowRecord, WorksheetInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable carrying a pre-issued OAuth access token.
pub const TOKEN_ENV_VAR: &str = "SHEETS_GATEWAY_TOKEN";

const FEED_QUERY: &str = "alt=json";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("service-account credentials unavailable: {0}")]
    Credentials(String),
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected backend payload: {0}")]
    Decode(String),
}

/// Authorization capability minted by the credential handshake. Holds the
/// ready-to-send `Authorization` header value.
#[derive(Debug, Clone)]
pub struct AuthToken {
    header: String,
}

impl AuthToken {
    pub fn bearer(token: &str) -> Self {
        Self {
            header: format!("Bearer {token}"),
        }
    }

    pub fn header_value(&self) -> &str {
        &self.header
    }
}

/// Operations the remote spreadsheet service exposes. One implementation
/// talks to Google; tests substitute their own.
#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    /// Performs the credential handshake, yielding an authorization
    /// capability for a single operation.
    async fn authenticate(&self) -> Result<AuthToken, BackendError>;

    /// Fetches document metadata including the full worksheet collection.
    async fn document_info(
        &self,
        auth: &AuthToken,
        sheet_id: &str,
    ) -> Result<DocumentInfo, BackendError>;

    /// Fetches the ordered row records of worksheet `sheet_index` (1-based).
    /// Each record carries user columns plus feed bookkeeping fields.
    async fn rows(
        &self,
        auth: &AuthToken,
        sheet_id: &str,
        sheet_index: u32,
    ) -> Result<Vec<RowRecord>, BackendError>;

    /// Appends `row` to worksheet `sheet_index` (1-based).
    async fn append_row(
        &self,
        auth: &AuthToken,
        sheet_id: &str,
        sheet_index: u32,
        row: &RowData,
    ) -> Result<(), BackendError>;
}

/// Service-account-style secret material, loaded once at startup from the
/// environment or a credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub client_email: Option<String>,
    pub access_token: String,
}

impl Credentials {
    /// Loads credentials from `SHEETS_GATEWAY_TOKEN` or, failing that, the
    /// configured credentials file. Returns `None` when neither is present;
    /// requests then fail the handshake instead of the process failing to
    /// boot, matching the per-request error contract.
    pub fn load(config: &ServerConfig) -> Result<Option<Self>, BackendError> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                return Ok(Some(Self {
                    client_email: None,
                    access_token: token,
                }));
            }
        }
        match config.credentials_file.as_deref() {
            Some(path) => Self::from_file(path).map(Some),
            None => Ok(None),
        }
    }

    fn from_file(path: &Path) -> Result<Self, BackendError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BackendError::Credentials(format!("failed to read {}: {e}", path.display()))
        })?;
        let credentials: Credentials = serde_json::from_str(&contents).map_err(|e| {
            BackendError::Credentials(format!("failed to parse {}: {e}", path.display()))
        })?;
        if credentials.access_token.trim().is_empty() {
            return Err(BackendError::Credentials(format!(
                "{} contains an empty access_token",
                path.display()
            )));
        }
        Ok(credentials)
    }
}

/// Reqwest-backed client for the Google Spreadsheets feeds.
pub struct GoogleSheetsClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl GoogleSheetsClient {
    pub fn new(config: &ServerConfig) -> Result<Self, BackendError> {
        let credentials = Credentials::load(config)?;
        if credentials.is_none() {
            tracing::warn!(
                "no service-account credentials configured; spreadsheet requests will be rejected"
            );
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn worksheets_feed_url(&self, sheet_id: &str) -> String {
        format!(
            "{}/feeds/worksheets/{sheet_id}/private/full?{FEED_QUERY}",
            self.base_url
        )
    }

    fn list_feed_url(&self, sheet_id: &str, sheet_index: u32) -> String {
        format!(
            "{}/feeds/list/{sheet_id}/{sheet_index}/private/full?{FEED_QUERY}",
            self.base_url
        )
    }

    async fn get_feed(&self, auth: &AuthToken, url: &str) -> Result<Value, BackendError> {
        let response = self
            .http
            .get(url)
            .header("Authorization", auth.header_value())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleSheetsClient {
    async fn authenticate(&self) -> Result<AuthToken, BackendError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            BackendError::Credentials("no service-account credentials configured".to_string())
        })?;
        if credentials.access_token.trim().is_empty() {
            return Err(BackendError::Credentials("empty access token".to_string()));
        }
        Ok(AuthToken::bearer(credentials.access_token.trim()))
    }

    async fn document_info(
        &self,
        auth: &AuthToken,
        sheet_id: &str,
    ) -> Result<DocumentInfo, BackendError> {
        let feed = self.get_feed(auth, &self.worksheets_feed_url(sheet_id)).await?;
        parse_document_info(sheet_id, &feed)
    }

    async fn rows(
        &self,
        auth: &AuthToken,
        sheet_id: &str,
        sheet_index: u32,
    ) -> Result<Vec<RowRecord>, BackendError> {
        let feed = self
            .get_feed(auth, &self.list_feed_url(sheet_id, sheet_index))
            .await?;
        let entries = feed_entries(&feed)?;
        Ok(entries.iter().map(flatten_list_entry).collect())
    }

    async fn append_row(
        &self,
        auth: &AuthToken,
        sheet_id: &str,
        sheet_index: u32,
        row: &RowData,
    ) -> Result<(), BackendError> {
        let mut entry = Map::new();
        for (column, value) in row {
            entry.insert(format!("gsx${}", gsx_key(column)), json!({ "$t": value }));
        }
        let response = self
            .http
            .post(self.list_feed_url(sheet_id, sheet_index))
            .header("Authorization", auth.header_value())
            .json(&Value::Object(entry))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(())
    }
}

/// Column keys in the list feed are lowercased with non-alphanumerics
/// removed, e.g. `First Name` becomes `firstname`.
pub fn gsx_key(column: &str) -> String {
    column
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn feed_entries(feed: &Value) -> Result<&Vec<Value>, BackendError> {
    let feed = feed
        .get("feed")
        .ok_or_else(|| BackendError::Decode("missing feed element".to_string()))?;
    match feed.get("entry") {
        Some(Value::Array(entries)) => Ok(entries),
        // An empty worksheet feed omits the entry array entirely.
        None => {
            static EMPTY: Vec<Value> = Vec::new();
            Ok(&EMPTY)
        }
        Some(_) => Err(BackendError::Decode("entry is not an array".to_string())),
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.get("$t")?.as_str().map(str::to_string)
}

fn timestamp(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    text(value, key)?.parse().ok()
}

fn count(value: &Value, key: &str) -> u32 {
    text(value, key)
        .and_then(|t| t.parse().ok())
        .unwrap_or_default()
}

fn entry_id(entry: &Value) -> String {
    text(entry, "id").unwrap_or_default()
}

fn parse_document_info(sheet_id: &str, feed: &Value) -> Result<DocumentInfo, BackendError> {
    let entries = feed_entries(feed)?;
    let root = feed
        .get("feed")
        .ok_or_else(|| BackendError::Decode("missing feed element".to_string()))?;
    let title = text(root, "title")
        .ok_or_else(|| BackendError::Decode("worksheets feed has no title".to_string()))?;

    let worksheets = entries
        .iter()
        .enumerate()
        .map(|(position, entry)| WorksheetInfo {
            index: position as u32 + 1,
            id: entry_id(entry)
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
            title: text(entry, "title").unwrap_or_default(),
            row_count: count(entry, "gs$rowCount"),
            col_count: count(entry, "gs$colCount"),
            updated: timestamp(entry, "updated"),
        })
        .collect();

    Ok(DocumentInfo {
        id: sheet_id.to_string(),
        title,
        updated: timestamp(root, "updated"),
        worksheets,
    })
}

/// Flattens a list-feed entry into the row shape the rest of the system
/// works with: bookkeeping fields first, then one key per `gsx$` column.
fn flatten_list_entry(entry: &Value) -> RowRecord {
    let mut row = Map::new();
    row.insert("id".to_string(), Value::String(entry_id(entry)));
    row.insert(
        "_xml".to_string(),
        Value::String(text(entry, "content").unwrap_or_default()),
    );
    row.insert(
        "app:edited".to_string(),
        Value::String(text(entry, "updated").unwrap_or_default()),
    );
    row.insert(
        "_links".to_string(),
        entry.get("link").cloned().unwrap_or(Value::Array(Vec::new())),
    );
    if let Some(fields) = entry.as_object() {
        for (key, value) in fields {
            if let Some(column) = key.strip_prefix("gsx$") {
                let cell = value
                    .get("$t")
                    .cloned()
                    .unwrap_or(Value::String(String::new()));
                row.insert(column.to_string(), cell);
            }
        }
    }
    Value::Object(row)
}
