use serde_json::{json, Value as JsonValue};

use crate::utils::types::{ColumnDef, ColumnType};

/// Shape name for schema generation responses
pub const SCHEMA_SHAPE_NAME: &str = "table_schema";

/// Shape name for data generation responses
pub const DATA_SHAPE_NAME: &str = "table_data";

/// JSON shape of a schema generation response: a `columns` array where each
/// entry carries name, one of the four storage classes, constraints and a
/// description, nothing more
pub fn schema_shape() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "columns": {
                "type": "array",
                "description": "The list of columns for the table",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "The name of the column, lowercase, no spaces"
                        },
                        "type": {
                            "type": "string",
                            "enum": ["INTEGER", "TEXT", "REAL", "BLOB"],
                            "description": "The SQLite type of the column"
                        },
                        "constraints": {
                            "type": "string",
                            "description": "SQL constraints for the column (e.g., PRIMARY KEY, UNIQUE)"
                        },
                        "description": {
                            "type": "string",
                            "description": "A brief description of the column"
                        }
                    },
                    "required": ["name", "type", "constraints", "description"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["columns"],
        "additionalProperties": false
    })
}

/// JSON shape of a data generation response for the given columns: a `rows`
/// array of objects with one required property per column and no extras
pub fn data_shape(columns: &[ColumnDef]) -> JsonValue {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::with_capacity(columns.len());

    for column in columns {
        let json_type = match column.column_type {
            ColumnType::Integer => "integer",
            ColumnType::Real => "number",
            ColumnType::Text | ColumnType::Blob => "string",
        };

        properties.insert(
            column.name.clone(),
            json!({"type": json_type, "description": column.description}),
        );
        required.push(JsonValue::String(column.name.clone()));
    }

    json!({
        "type": "object",
        "properties": {
            "rows": {
                "type": "array",
                "description": "Generated data rows",
                "items": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false
                }
            }
        },
        "required": ["rows"],
        "additionalProperties": false
    })
}
