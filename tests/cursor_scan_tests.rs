use serde_json::json;
use std::sync::Arc;

use mirage_engine::cache::DataCache;
use mirage_engine::generator::MockGenerator;
use mirage_engine::prompt::TemplateRenderer;
use mirage_engine::utils::error::CursorError;
use mirage_engine::utils::types::{CellValue, ColumnType, OrderTerm, ScanConstraint};
use mirage_engine::utils::types::ConstraintOp;
use mirage_engine::vtab::{Openable, Resolvable, Scannable, TableCursor, TableModule};

/// Schema with all four storage classes and data exercising the coercion
/// edge cases: an absent column, an explicit null and a mistyped cell.
fn mixed_type_generator() -> MockGenerator {
    MockGenerator::new()
        .with_schema_response(json!({
            "columns": [
                {"name": "id", "type": "INTEGER", "constraints": "PRIMARY KEY", "description": ""},
                {"name": "name", "type": "TEXT", "constraints": "", "description": ""},
                {"name": "score", "type": "REAL", "constraints": "", "description": ""},
                {"name": "payload", "type": "BLOB", "constraints": "", "description": ""}
            ]
        }))
        .with_data_response(json!({
            "rows": [
                {"id": 1, "name": "Alice", "score": 9.5, "payload": "abc"},
                {"id": 2, "name": null, "payload": [104, 105]},
                {"id": "oops", "name": "Charlie", "score": 4}
            ]
        }))
}

async fn scan_cursor(cache_dir: &std::path::Path) -> TableCursor {
    let module = TableModule::new(
        Arc::new(mixed_type_generator()),
        Arc::new(TemplateRenderer::new()),
        Arc::new(DataCache::new(cache_dir)),
    );

    let handle = module.resolve("samples", "Mixed type samples").await.unwrap();
    handle.open().await.unwrap()
}

#[tokio::test]
async fn test_cursor_walks_every_position_then_ends() {
    let dir = tempfile::tempdir().unwrap();
    let mut cursor = scan_cursor(dir.path()).await;
    cursor.filter(&[]);

    for expected_identity in 0..3 {
        assert!(!cursor.at_end());
        assert_eq!(cursor.row_identity(), expected_identity);
        cursor.advance();
    }

    assert!(cursor.at_end());
    assert!(matches!(
        cursor.read_column(0),
        Err(CursorError::OutOfRange { position: 3, .. })
    ));
}

#[tokio::test]
async fn test_integer_and_real_coercion() {
    let dir = tempfile::tempdir().unwrap();
    let cursor = scan_cursor(dir.path()).await;

    assert_eq!(cursor.read_column(0), Ok(CellValue::Integer(1)));
    assert_eq!(cursor.read_column(2), Ok(CellValue::Real(9.5)));
}

#[tokio::test]
async fn test_blob_coercion_from_string_and_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let mut cursor = scan_cursor(dir.path()).await;

    assert_eq!(cursor.read_column(3), Ok(CellValue::Blob(b"abc".to_vec())));

    cursor.advance();
    assert_eq!(cursor.read_column(3), Ok(CellValue::Blob(vec![104, 105])));
}

#[tokio::test]
async fn test_absent_and_null_cells_read_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let mut cursor = scan_cursor(dir.path()).await;
    cursor.advance();

    // Explicit null in the stored row.
    assert_eq!(cursor.read_column(1), Ok(CellValue::Null));
    // Column entirely absent from the stored row.
    assert_eq!(cursor.read_column(2), Ok(CellValue::Null));
}

#[tokio::test]
async fn test_mistyped_cell_fails_alone_without_sinking_the_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut cursor = scan_cursor(dir.path()).await;
    cursor.advance();
    cursor.advance();

    match cursor.read_column(0) {
        Err(CursorError::TypeMismatch { column, expected }) => {
            assert_eq!(column, "id");
            assert_eq!(expected, ColumnType::Integer);
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }

    // Sibling cells in the same row stay readable.
    assert_eq!(
        cursor.read_column(1),
        Ok(CellValue::Text("Charlie".to_string()))
    );
    // An integer-valued number satisfies a REAL column.
    assert_eq!(cursor.read_column(2), Ok(CellValue::Real(4.0)));
}

#[tokio::test]
async fn test_column_index_out_of_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cursor = scan_cursor(dir.path()).await;

    assert!(matches!(
        cursor.read_column(4),
        Err(CursorError::OutOfRange { index: 4, .. })
    ));
}

#[tokio::test]
async fn test_filter_restarts_an_exhausted_scan() {
    let dir = tempfile::tempdir().unwrap();
    let mut cursor = scan_cursor(dir.path()).await;

    while !cursor.at_end() {
        cursor.advance();
    }

    cursor.filter(&[CellValue::Text("ignored pushdown".to_string())]);
    assert_eq!(cursor.row_identity(), 0);
    assert!(!cursor.at_end());
}

#[tokio::test]
async fn test_close_is_an_idempotent_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let mut cursor = scan_cursor(dir.path()).await;

    cursor.close();
    cursor.close();
    assert_eq!(cursor.read_column(0), Ok(CellValue::Integer(1)));
}

#[tokio::test]
async fn test_scan_planning_reports_no_constraints_used() {
    let dir = tempfile::tempdir().unwrap();
    let module = TableModule::new(
        Arc::new(mixed_type_generator()),
        Arc::new(TemplateRenderer::new()),
        Arc::new(DataCache::new(dir.path())),
    );
    let handle = module.resolve("samples", "").await.unwrap();

    let constraints = vec![
        ScanConstraint {
            column: 0,
            op: ConstraintOp::Equal,
        },
        ScanConstraint {
            column: 2,
            op: ConstraintOp::GreaterThan,
        },
    ];
    let ordering = vec![OrderTerm {
        column: 0,
        descending: false,
    }];

    let plan = handle.plan_scan(&constraints, &ordering);

    assert_eq!(plan.constraint_usage, vec![false, false]);
    assert!(!plan.ordered);
}

#[tokio::test]
async fn test_concurrent_cursors_share_one_row_set() {
    let dir = tempfile::tempdir().unwrap();
    let module = TableModule::new(
        Arc::new(mixed_type_generator()),
        Arc::new(TemplateRenderer::new()),
        Arc::new(DataCache::new(dir.path())),
    );
    let handle = module.resolve("samples", "").await.unwrap();

    let mut first = handle.open().await.unwrap();
    let second = handle.open().await.unwrap();

    first.advance();
    first.advance();

    // Each cursor owns its position; the rows underneath are shared.
    assert_eq!(first.row_identity(), 2);
    assert_eq!(second.row_identity(), 0);
    assert_eq!(second.read_column(0), Ok(CellValue::Integer(1)));
}
