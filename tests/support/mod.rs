//! Shared test fixtures: an in-memory spreadsheet backend and helpers for
//! driving the router without a network.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{Value, json};
use sheets_gateway::backend::{AuthToken, BackendError, SpreadsheetBackend};
use sheets_gateway::config::{CliArgs, ServerConfig};
use sheets_gateway::model::{DocumentInfo, RowData, RowRecord, WorksheetInfo};
use sheets_gateway::server::build_router;
use sheets_gateway::state::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

pub const VALID_ID: &str = "1aBcDeFgHiJkLmNoPqRsTuVwXyZ";

#[derive(Debug, Clone)]
pub struct AppendCall {
    pub sheet_id: String,
    pub sheet_index: u32,
    pub row: RowData,
}

/// In-memory stand-in for the Google feeds. Unknown document ids behave
/// like documents that are not shared with the service account.
#[derive(Default)]
pub struct MockBackend {
    documents: HashMap<String, DocumentInfo>,
    rows: HashMap<(String, u32), Vec<RowRecord>>,
    auth_fails: bool,
    appends: Mutex<Vec<AppendCall>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_auth() -> Self {
        Self {
            auth_fails: true,
            ..Self::default()
        }
    }

    pub fn with_document(mut self, sheet_id: &str, document: DocumentInfo) -> Self {
        self.documents.insert(sheet_id.to_string(), document);
        self
    }

    pub fn with_rows(mut self, sheet_id: &str, sheet_index: u32, rows: Vec<RowRecord>) -> Self {
        self.rows.insert((sheet_id.to_string(), sheet_index), rows);
        self
    }

    pub fn appends(&self) -> Vec<AppendCall> {
        self.appends.lock().clone()
    }
}

#[async_trait]
impl SpreadsheetBackend for MockBackend {
    async fn authenticate(&self) -> Result<AuthToken, BackendError> {
        if self.auth_fails {
            return Err(BackendError::Credentials(
                "token rejected by backend".to_string(),
            ));
        }
        Ok(AuthToken::bearer("test-token"))
    }

    async fn document_info(
        &self,
        _auth: &AuthToken,
        sheet_id: &str,
    ) -> Result<DocumentInfo, BackendError> {
        self.documents
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| not_shared(sheet_id))
    }

    async fn rows(
        &self,
        _auth: &AuthToken,
        sheet_id: &str,
        sheet_index: u32,
    ) -> Result<Vec<RowRecord>, BackendError> {
        self.rows
            .get(&(sheet_id.to_string(), sheet_index))
            .cloned()
            .ok_or_else(|| not_shared(sheet_id))
    }

    async fn append_row(
        &self,
        _auth: &AuthToken,
        sheet_id: &str,
        sheet_index: u32,
        row: &RowData,
    ) -> Result<(), BackendError> {
        if !self.documents.contains_key(sheet_id) {
            return Err(not_shared(sheet_id));
        }
        self.appends.lock().push(AppendCall {
            sheet_id: sheet_id.to_string(),
            sheet_index,
            row: row.clone(),
        });
        Ok(())
    }
}

fn not_shared(sheet_id: &str) -> BackendError {
    BackendError::Status {
        status: StatusCode::FORBIDDEN,
        body: format!("document {sheet_id} is not shared with the service account"),
    }
}

pub fn sample_document() -> DocumentInfo {
    DocumentInfo {
        id: VALID_ID.to_string(),
        title: "Team Roster".to_string(),
        updated: None,
        worksheets: vec![
            WorksheetInfo {
                index: 1,
                id: "od6".to_string(),
                title: "Sheet1".to_string(),
                row_count: 1000,
                col_count: 26,
                updated: None,
            },
            WorksheetInfo {
                index: 2,
                id: "od7".to_string(),
                title: "Archive".to_string(),
                row_count: 50,
                col_count: 10,
                updated: None,
            },
        ],
    }
}

pub fn raw_row(n: u32, name: &str, age: &str) -> RowRecord {
    json!({
        "id": format!("https://spreadsheets.google.com/feeds/list/{VALID_ID}/1/r{n}"),
        "_xml": format!("name: {name}, age: {age}"),
        "app:edited": "2019-03-01T10:00:00Z",
        "_links": [{"rel": "self"}],
        "name": name,
        "age": age
    })
}

pub fn sample_rows() -> Vec<RowRecord> {
    vec![
        raw_row(1, "Alice", "30"),
        raw_row(2, "Bob", "41"),
        raw_row(3, "Carol", "28"),
    ]
}

/// A backend pre-loaded with the sample document and its first worksheet.
pub fn sample_backend() -> MockBackend {
    MockBackend::new()
        .with_document(VALID_ID, sample_document())
        .with_rows(VALID_ID, 1, sample_rows())
}

pub fn test_router(backend: Arc<dyn SpreadsheetBackend>) -> Router {
    let config = ServerConfig::from_args(CliArgs::default()).expect("default config");
    let state = Arc::new(AppState::new(Arc::new(config), backend));
    build_router(state)
}

pub async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get_text(router: Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

pub async fn post_json(router: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
