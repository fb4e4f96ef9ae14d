//! Adapter-level tests for `SheetService`, exercised against the in-memory
//! backend.

mod support;

use assert_matches::assert_matches;
use serde_json::{Map, json};
use sheets_gateway::error::ApiError;
use sheets_gateway::service::SheetService;
use std::sync::Arc;
use support::{VALID_ID, MockBackend, sample_backend};

fn service() -> SheetService {
    SheetService::new(Arc::new(sample_backend()))
}

#[tokio::test]
async fn omitted_worksheet_index_means_index_one() {
    let service = service();
    let defaulted = service.rows(VALID_ID, None).await.unwrap();
    let explicit = service.rows(VALID_ID, Some("1")).await.unwrap();
    assert_eq!(defaulted, explicit);
    assert_eq!(defaulted.len(), 3);
}

#[tokio::test]
async fn omitted_worksheet_index_defaults_for_worksheet_info() {
    let service = service();
    let info = service.worksheet_info(VALID_ID, None).await.unwrap();
    assert_eq!(info.index, 1);
    assert_eq!(info.title, "Sheet1");
}

#[tokio::test]
async fn rows_come_back_normalized() {
    let service = service();
    let rows = service.rows(VALID_ID, None).await.unwrap();
    for row in &rows {
        let map = row.as_object().unwrap();
        assert!(!map.contains_key("id"));
        assert!(!map.contains_key("_xml"));
        assert!(!map.contains_key("app:edited"));
        assert!(!map.contains_key("_links"));
    }
}

#[tokio::test]
async fn row_selection_is_one_based() {
    let service = service();
    let first = service.row(VALID_ID, "1", None).await.unwrap();
    assert_eq!(first["name"], "Alice");
    let third = service.row(VALID_ID, "3", None).await.unwrap();
    assert_eq!(third["name"], "Carol");
}

#[tokio::test]
async fn out_of_range_row_is_not_found() {
    let service = service();
    let err = service.row(VALID_ID, "4", None).await.unwrap_err();
    assert_matches!(err, ApiError::NotFound(_));
}

#[tokio::test]
async fn out_of_range_worksheet_is_not_found() {
    let service = service();
    let err = service.worksheet_info(VALID_ID, Some("3")).await.unwrap_err();
    assert_matches!(err, ApiError::NotFound(_));
}

#[tokio::test]
async fn non_numeric_row_index_is_a_bad_request() {
    let service = service();
    let err = service.row(VALID_ID, "third", None).await.unwrap_err();
    assert_matches!(err, ApiError::BadRequest(_));
}

#[tokio::test]
async fn append_returns_the_input_not_the_stored_state() {
    let backend = Arc::new(sample_backend());
    let service = SheetService::new(backend.clone());

    let mut row = Map::new();
    row.insert("Name".to_string(), json!("Dora"));
    row.insert("Age".to_string(), json!("35"));

    let echoed = service
        .append_row(VALID_ID, row.clone(), None)
        .await
        .unwrap();
    assert_eq!(echoed, row);

    // The backend saw the append on the default worksheet.
    let appends = backend.appends();
    assert_eq!(appends.len(), 1);
    assert_eq!(appends[0].sheet_index, 1);
    assert_eq!(appends[0].row, row);
}

#[tokio::test]
async fn every_operation_collapses_auth_failure_to_bad_request() {
    let service = SheetService::new(Arc::new(MockBackend::failing_auth()));

    assert_matches!(
        service.document_info(VALID_ID).await.unwrap_err(),
        ApiError::BadRequest(_)
    );
    assert_matches!(
        service.worksheet_info(VALID_ID, None).await.unwrap_err(),
        ApiError::BadRequest(_)
    );
    assert_matches!(
        service.rows(VALID_ID, None).await.unwrap_err(),
        ApiError::BadRequest(_)
    );
    assert_matches!(
        service.row(VALID_ID, "1", None).await.unwrap_err(),
        ApiError::BadRequest(_)
    );
    assert_matches!(
        service
            .append_row(VALID_ID, Map::new(), None)
            .await
            .unwrap_err(),
        ApiError::BadRequest(_)
    );
}
