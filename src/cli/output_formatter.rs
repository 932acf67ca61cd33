use base64::prelude::*;
use colored::*;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use crate::cli::cli_args::OutputFormat;
use crate::utils::error::MirageError;
use crate::utils::types::{CellValue, ColumnDef};

/// One materialized scan, ready for display
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<CellValue>>,
    pub elapsed: Duration,
}

/// Formats scan results and messages for CLI output
pub struct OutputFormatter;

impl OutputFormatter {
    /// Format a scan according to the specified format
    pub fn format_scan(output: &ScanOutput, format: &OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(output),
            OutputFormat::Json => Self::format_json(output),
            OutputFormat::Csv => Self::format_csv(output),
        }
    }

    /// Format a scan as a colored table
    fn format_table(output: &ScanOutput) -> String {
        if output.rows.is_empty() {
            return "No rows found.".dimmed().to_string();
        }

        let mut rendered = String::new();

        // Calculate column widths
        let mut col_widths: Vec<usize> = output
            .columns
            .iter()
            .map(|col| col.name.len())
            .collect();

        for row in &output.rows {
            for (i, value) in row.iter().enumerate() {
                if i < col_widths.len() {
                    let value_str = Self::value_to_string(value);
                    col_widths[i] = col_widths[i].max(value_str.len());
                }
            }
        }

        // Ensure minimum width
        for width in &mut col_widths {
            *width = (*width).max(8);
        }

        // Header
        rendered.push_str(&Self::format_table_separator(&col_widths, true));
        rendered.push('|');
        for (i, col) in output.columns.iter().enumerate() {
            rendered.push_str(&format!(
                " {:<width$} |",
                col.name.bold().cyan(),
                width = col_widths[i]
            ));
        }
        rendered.push('\n');
        rendered.push_str(&Self::format_table_separator(&col_widths, false));

        // Data rows
        for row in &output.rows {
            rendered.push('|');
            for (i, value) in row.iter().enumerate() {
                if i < col_widths.len() {
                    rendered.push_str(&format!(
                        " {:<width$} |",
                        Self::format_value_colored(value),
                        width = col_widths[i]
                    ));
                }
            }
            rendered.push('\n');
        }

        rendered.push_str(&Self::format_table_separator(&col_widths, true));

        // Footer with metadata
        rendered.push_str(&format!(
            "\n{} {} in {:.2}ms\n",
            output.rows.len().to_string().green().bold(),
            if output.rows.len() == 1 { "row" } else { "rows" },
            output.elapsed.as_millis()
        ));

        rendered
    }

    /// Format table separator line
    fn format_table_separator(col_widths: &[usize], is_border: bool) -> String {
        let mut separator = String::new();
        let edge = if is_border { '+' } else { '|' };

        separator.push(edge);
        for &width in col_widths {
            separator.push_str(&"-".repeat(width + 2));
            separator.push(edge);
        }
        separator.push('\n');
        separator
    }

    /// Format a scan as JSON
    fn format_json(output: &ScanOutput) -> String {
        let mut rows = Vec::new();

        for row in &output.rows {
            let mut row_obj = serde_json::Map::new();
            for (i, value) in row.iter().enumerate() {
                if let Some(col) = output.columns.get(i) {
                    row_obj.insert(col.name.clone(), Self::value_to_json(value));
                }
            }
            rows.push(JsonValue::Object(row_obj));
        }

        let document = json!({
            "data": rows,
            "metadata": {
                "table": output.table_name,
                "columns": output.columns.iter().map(|col| {
                    json!({
                        "name": col.name,
                        "type": col.column_type.to_string(),
                        "constraints": col.constraints
                    })
                }).collect::<Vec<_>>(),
                "row_count": output.rows.len(),
                "execution_time_ms": output.elapsed.as_millis()
            }
        });

        serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format a scan as CSV
    fn format_csv(output: &ScanOutput) -> String {
        let mut rendered = String::new();

        let headers: Vec<String> = output
            .columns
            .iter()
            .map(|col| Self::escape_csv_field(&col.name))
            .collect();
        rendered.push_str(&headers.join(","));
        rendered.push('\n');

        for row in &output.rows {
            let values: Vec<String> = row
                .iter()
                .map(|value| Self::escape_csv_field(&Self::value_to_string(value)))
                .collect();
            rendered.push_str(&values.join(","));
            rendered.push('\n');
        }

        rendered
    }

    /// Convert a cell value to a display string
    pub fn value_to_string(value: &CellValue) -> String {
        match value {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Real(f) => format!("{:.2}", f),
            CellValue::Blob(b) => format!("<blob: {} bytes>", b.len()),
            CellValue::Null => "NULL".to_string(),
        }
    }

    /// Convert a cell value to a colored string for table display
    fn format_value_colored(value: &CellValue) -> ColoredString {
        match value {
            CellValue::Text(s) => s.normal(),
            CellValue::Integer(i) => i.to_string().blue(),
            CellValue::Real(f) => format!("{:.2}", f).blue(),
            CellValue::Blob(b) => format!("<blob: {} bytes>", b.len()).cyan(),
            CellValue::Null => "NULL".dimmed(),
        }
    }

    /// Convert a cell value to JSON; blobs render as base64
    fn value_to_json(value: &CellValue) -> JsonValue {
        match value {
            CellValue::Text(s) => JsonValue::String(s.clone()),
            CellValue::Integer(i) => JsonValue::Number((*i).into()),
            CellValue::Real(f) => {
                if let Some(num) = serde_json::Number::from_f64(*f) {
                    JsonValue::Number(num)
                } else {
                    JsonValue::Null
                }
            }
            CellValue::Blob(b) => JsonValue::String(BASE64_STANDARD.encode(b)),
            CellValue::Null => JsonValue::Null,
        }
    }

    /// Escape CSV field if it contains special characters
    fn escape_csv_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Format error message for CLI display
    pub fn format_error(error: &MirageError) -> String {
        format!("{} {}", "Error:".red().bold(), error.to_string().red())
    }

    /// Format success message for CLI display
    pub fn format_success(message: &str) -> String {
        format!("{} {}", "Success:".green().bold(), message)
    }

    /// Format info message for CLI display
    pub fn format_info(message: &str) -> String {
        format!("{} {}", "Info:".blue().bold(), message)
    }

    /// Format warning message for CLI display
    pub fn format_warning(message: &str) -> String {
        format!("{} {}", "Warning:".yellow().bold(), message)
    }
}
