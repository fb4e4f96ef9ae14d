//! Strips backend bookkeeping fields out of row records before they reach
//! clients.

use serde_json::Value;

/// Feed-internal fields that must never appear in a row returned to a
/// client. Only user-authored column data survives normalization.
pub const BOOKKEEPING_FIELDS: [&str; 4] = ["id", "_xml", "app:edited", "_links"];

/// Removes the bookkeeping fields from a row record if they are present.
///
/// Non-object values (including `null`) pass through unchanged; a missing
/// field is not an error. Remaining keys keep their order and values.
pub fn normalize_row(mut row: Value) -> Value {
    if let Value::Object(map) = &mut row {
        for field in BOOKKEEPING_FIELDS {
            map.shift_remove(field);
        }
    }
    row
}

/// Applies [`normalize_row`] to each record, preserving order and length.
pub fn normalize_rows(rows: Vec<Value>) -> Vec<Value> {
    rows.into_iter().map(normalize_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_row() -> Value {
        json!({
            "id": "https://spreadsheets.google.com/feeds/list/abc/1/cokwr",
            "_xml": "<entry>...</entry>",
            "app:edited": "2019-03-01T10:00:00.000Z",
            "_links": {"self": "https://spreadsheets.google.com/feeds/list/abc/1/cokwr"},
            "name": "Alice",
            "age": "30"
        })
    }

    #[test]
    fn strips_every_bookkeeping_field() {
        let row = normalize_row(raw_row());
        let map = row.as_object().unwrap();
        for field in BOOKKEEPING_FIELDS {
            assert!(!map.contains_key(field), "{field} should be stripped");
        }
        assert_eq!(map.get("name"), Some(&json!("Alice")));
        assert_eq!(map.get("age"), Some(&json!("30")));
    }

    #[test]
    fn preserves_remaining_key_order() {
        let row = normalize_row(json!({
            "id": "x",
            "zebra": 1,
            "_xml": "y",
            "apple": 2,
            "_links": [],
            "mango": 3
        }));
        let keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn partial_bookkeeping_subset_is_fine() {
        let row = normalize_row(json!({"id": "x", "name": "Bob"}));
        assert_eq!(row, json!({"name": "Bob"}));
    }

    #[test]
    fn non_object_values_pass_through() {
        assert_eq!(normalize_row(Value::Null), Value::Null);
        assert_eq!(normalize_row(json!("scalar")), json!("scalar"));
        assert_eq!(normalize_row(json!(42)), json!(42));
    }

    #[test]
    fn empty_object_passes_through() {
        assert_eq!(normalize_row(json!({})), json!({}));
    }

    #[test]
    fn idempotent() {
        let once = normalize_row(raw_row());
        let twice = normalize_row(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn normalizes_sequence_in_order() {
        let rows = vec![
            json!({"id": "a", "name": "first"}),
            json!({"id": "b", "name": "second"}),
            json!({"id": "c", "name": "third"}),
        ];
        let normalized = normalize_rows(rows);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0], json!({"name": "first"}));
        assert_eq!(normalized[1], json!({"name": "second"}));
        assert_eq!(normalized[2], json!({"name": "third"}));
    }

    #[test]
    fn value_types_survive() {
        let row = normalize_row(json!({
            "id": "x",
            "count": 7,
            "ratio": 0.5,
            "active": true,
            "note": null
        }));
        let map = row.as_object().unwrap();
        assert!(map.get("count").unwrap().is_u64());
        assert!(map.get("ratio").unwrap().is_f64());
        assert!(map.get("active").unwrap().is_boolean());
        assert!(map.get("note").unwrap().is_null());
    }
}
