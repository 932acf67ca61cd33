use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::cache::DataCache;
use crate::generator::{output_shape, GenerationRequest, Generator};
use crate::prompt::PromptRenderer;
use crate::utils::{
    error::{DataError, MirageResult},
    types::{ColumnDef, OrderTerm, Row, ScanConstraint, ScanPlan},
};
use crate::vtab::cursor::TableCursor;
use crate::vtab::vtab_trait::Openable;

#[derive(Debug, Deserialize)]
struct DataResponse {
    rows: Vec<Row>,
}

/// One bound table: name, description and resolved columns.
///
/// Existing only after a successful schema resolution, the handle
/// orchestrates data-cache lookup and population and hands out cursors over
/// the materialized rows.
pub struct ResolvedTable {
    table_name: String,
    table_description: String,
    columns: Arc<Vec<ColumnDef>>,
    generator: Arc<dyn Generator>,
    renderer: Arc<dyn PromptRenderer>,
    data_cache: Arc<DataCache>,
}

impl ResolvedTable {
    pub(crate) fn new(
        table_name: &str,
        table_description: &str,
        columns: Arc<Vec<ColumnDef>>,
        generator: Arc<dyn Generator>,
        renderer: Arc<dyn PromptRenderer>,
        data_cache: Arc<DataCache>,
    ) -> Self {
        Self {
            table_name: table_name.to_string(),
            table_description: table_description.to_string(),
            columns,
            generator,
            renderer,
            data_cache,
        }
    }

    /// The bound table's name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The description the table was declared with
    pub fn table_description(&self) -> &str {
        &self.table_description
    }
}

#[async_trait]
impl Openable for ResolvedTable {
    type Cursor = TableCursor;

    async fn open(&self) -> MirageResult<TableCursor> {
        let generator = Arc::clone(&self.generator);
        let prompt = self
            .renderer
            .render_data_prompt(&self.table_name, &self.table_description);
        let shape = output_shape::data_shape(&self.columns);
        let table = self.table_name.clone();

        let rows = self
            .data_cache
            .get_or_materialize(&self.table_name, async move {
                let request =
                    GenerationRequest::new(prompt, output_shape::DATA_SHAPE_NAME, shape);
                let payload = generator
                    .generate(request)
                    .await
                    .map_err(DataError::Generator)?;

                Ok(parse_rows(&table, payload)?)
            })
            .await?;

        Ok(TableCursor::new(Arc::clone(&self.columns), rows))
    }

    fn plan_scan(&self, constraints: &[ScanConstraint], _ordering: &[OrderTerm]) -> ScanPlan {
        // Always a full scan; the host engine post-filters.
        ScanPlan::full_scan(constraints.len())
    }

    fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    fn declaration(&self) -> String {
        let fragments: Vec<String> = self
            .columns
            .iter()
            .map(ColumnDef::ddl_fragment)
            .collect();

        format!("CREATE TABLE {} ({})", self.table_name, fragments.join(", "))
    }
}

/// Validate a raw generator data response into rows; the response is
/// accepted or rejected as a unit
fn parse_rows(table_name: &str, payload: JsonValue) -> Result<Vec<Row>, DataError> {
    let response: DataResponse =
        serde_json::from_value(payload).map_err(|e| DataError::MalformedResponse {
            table: table_name.to_string(),
            detail: e.to_string(),
        })?;

    if response.rows.is_empty() {
        return Err(DataError::EmptyData(table_name.to_string()));
    }

    Ok(response.rows)
}
