use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::utils::{
    error::CursorError,
    types::{CellValue, ColumnDef, ColumnType, RowSet},
};
use crate::vtab::vtab_trait::Scannable;

/// Sequential cursor over a table's materialized rows.
///
/// The cursor exclusively owns its position; the row set it reads is shared
/// immutably with every other cursor on the same table, so concurrent scans
/// need no locking. Values are coerced against the declared column type at
/// read time only.
pub struct TableCursor {
    columns: Arc<Vec<ColumnDef>>,
    rows: Arc<RowSet>,
    position: usize,
}

impl TableCursor {
    pub(crate) fn new(columns: Arc<Vec<ColumnDef>>, rows: Arc<RowSet>) -> Self {
        Self {
            columns,
            rows,
            position: 0,
        }
    }

    /// Total number of materialized rows under this cursor
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl Scannable for TableCursor {
    fn filter(&mut self, _constraint_args: &[CellValue]) {
        self.position = 0;
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn at_end(&self) -> bool {
        self.position >= self.rows.len()
    }

    fn row_identity(&self) -> i64 {
        self.position as i64
    }

    fn read_column(&self, index: usize) -> Result<CellValue, CursorError> {
        let out_of_range = CursorError::OutOfRange {
            position: self.position,
            index,
        };

        let row = self.rows.get(self.position).ok_or_else(|| out_of_range.clone())?;
        let column = self.columns.get(index).ok_or(out_of_range)?;

        match row.get(&column.name) {
            None | Some(JsonValue::Null) => Ok(CellValue::Null),
            Some(value) => coerce(column, value),
        }
    }
}

/// Coerce a stored value against the column's declared type
fn coerce(column: &ColumnDef, value: &JsonValue) -> Result<CellValue, CursorError> {
    match column.column_type {
        ColumnType::Integer => match value {
            JsonValue::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    Ok(CellValue::Integer(integer))
                } else {
                    match number.as_f64() {
                        Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                            Ok(CellValue::Integer(float as i64))
                        }
                        _ => Err(mismatch(column)),
                    }
                }
            }
            _ => Err(mismatch(column)),
        },
        ColumnType::Text => match value {
            JsonValue::String(text) => Ok(CellValue::Text(text.clone())),
            _ => Err(mismatch(column)),
        },
        ColumnType::Real => match value.as_f64() {
            Some(float) => Ok(CellValue::Real(float)),
            None => Err(mismatch(column)),
        },
        ColumnType::Blob => match value {
            // A string is interpreted as raw bytes.
            JsonValue::String(text) => Ok(CellValue::Blob(text.clone().into_bytes())),
            JsonValue::Array(items) => {
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_u64() {
                        Some(byte) if byte <= u8::MAX as u64 => bytes.push(byte as u8),
                        _ => return Err(mismatch(column)),
                    }
                }
                Ok(CellValue::Blob(bytes))
            }
            _ => Err(mismatch(column)),
        },
    }
}

fn mismatch(column: &ColumnDef) -> CursorError {
    CursorError::TypeMismatch {
        column: column.name.clone(),
        expected: column.column_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::types::Row;
    use serde_json::json;

    fn sample_columns() -> Arc<Vec<ColumnDef>> {
        Arc::new(vec![
            ColumnDef::new("id", ColumnType::Integer),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("score", ColumnType::Real),
            ColumnDef::new("payload", ColumnType::Blob),
        ])
    }

    fn row(values: JsonValue) -> Row {
        match values {
            JsonValue::Object(map) => map,
            _ => panic!("row literal must be an object"),
        }
    }

    fn cursor_over(rows: Vec<Row>) -> TableCursor {
        TableCursor::new(sample_columns(), Arc::new(RowSet::new(rows)))
    }

    #[test]
    fn test_integer_coercion_accepts_integer_valued_numbers() {
        let cursor = cursor_over(vec![row(json!({"id": 30}))]);
        assert_eq!(cursor.read_column(0), Ok(CellValue::Integer(30)));

        let cursor = cursor_over(vec![row(json!({"id": 30.0}))]);
        assert_eq!(cursor.read_column(0), Ok(CellValue::Integer(30)));
    }

    #[test]
    fn test_integer_coercion_rejects_strings_and_fractions() {
        let cursor = cursor_over(vec![row(json!({"id": "thirty"}))]);
        assert_eq!(
            cursor.read_column(0),
            Err(CursorError::TypeMismatch {
                column: "id".to_string(),
                expected: ColumnType::Integer,
            })
        );

        let cursor = cursor_over(vec![row(json!({"id": 30.5}))]);
        assert!(cursor.read_column(0).is_err());
    }

    #[test]
    fn test_text_coercion() {
        let cursor = cursor_over(vec![row(json!({"name": "Alice"}))]);
        assert_eq!(
            cursor.read_column(1),
            Ok(CellValue::Text("Alice".to_string()))
        );

        let cursor = cursor_over(vec![row(json!({"name": 7}))]);
        assert!(matches!(
            cursor.read_column(1),
            Err(CursorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_real_coercion_accepts_any_number() {
        let cursor = cursor_over(vec![row(json!({"score": 9.5}))]);
        assert_eq!(cursor.read_column(2), Ok(CellValue::Real(9.5)));

        let cursor = cursor_over(vec![row(json!({"score": 9}))]);
        assert_eq!(cursor.read_column(2), Ok(CellValue::Real(9.0)));
    }

    #[test]
    fn test_blob_coercion_from_string_and_byte_array() {
        let cursor = cursor_over(vec![row(json!({"payload": "abc"}))]);
        assert_eq!(cursor.read_column(3), Ok(CellValue::Blob(b"abc".to_vec())));

        let cursor = cursor_over(vec![row(json!({"payload": [1, 2, 255]}))]);
        assert_eq!(
            cursor.read_column(3),
            Ok(CellValue::Blob(vec![1, 2, 255]))
        );

        let cursor = cursor_over(vec![row(json!({"payload": [1, 256]}))]);
        assert!(cursor.read_column(3).is_err());
    }

    #[test]
    fn test_absent_and_null_values_read_as_null() {
        let cursor = cursor_over(vec![row(json!({"id": 1, "name": null}))]);

        assert_eq!(cursor.read_column(1), Ok(CellValue::Null));
        assert_eq!(cursor.read_column(2), Ok(CellValue::Null));
    }

    #[test]
    fn test_bounds() {
        let mut cursor = cursor_over(vec![
            row(json!({"id": 1})),
            row(json!({"id": 2})),
        ]);

        assert!(!cursor.at_end());
        assert_eq!(cursor.row_identity(), 0);

        cursor.advance();
        assert!(!cursor.at_end());
        assert_eq!(cursor.row_identity(), 1);

        cursor.advance();
        assert!(cursor.at_end());
        assert!(matches!(
            cursor.read_column(0),
            Err(CursorError::OutOfRange { position: 2, .. })
        ));
    }

    #[test]
    fn test_column_index_out_of_range() {
        let cursor = cursor_over(vec![row(json!({"id": 1}))]);

        assert!(matches!(
            cursor.read_column(4),
            Err(CursorError::OutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn test_filter_resets_position() {
        let mut cursor = cursor_over(vec![row(json!({"id": 1})), row(json!({"id": 2}))]);

        cursor.advance();
        cursor.advance();
        assert!(cursor.at_end());

        cursor.filter(&[CellValue::Integer(99)]);
        assert_eq!(cursor.row_identity(), 0);
        assert!(!cursor.at_end());
    }

    #[test]
    fn test_mismatch_does_not_invalidate_the_cursor() {
        let cursor = cursor_over(vec![row(json!({"id": "bad", "name": "Alice"}))]);

        assert!(cursor.read_column(0).is_err());
        assert_eq!(
            cursor.read_column(1),
            Ok(CellValue::Text("Alice".to_string()))
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut cursor = cursor_over(vec![row(json!({"id": 1}))]);

        cursor.close();
        cursor.close();
        assert_eq!(cursor.row_count(), 1);
    }
}
