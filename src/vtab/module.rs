use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{DataCache, SchemaCache};
use crate::generator::{
    output_shape, GenerationRequest, Generator, OpenAiGenerator,
};
use crate::prompt::{PromptRenderer, TemplateRenderer};
use crate::utils::{
    config::EngineConfig,
    error::{GeneratorError, MirageResult, SchemaError},
    types::{ColumnDef, ColumnType},
};
use crate::vtab::table::ResolvedTable;
use crate::vtab::vtab_trait::Resolvable;

/// Raw column as returned by the generator, before validation
#[derive(Debug, Deserialize)]
struct GeneratedColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    constraints: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    columns: Vec<GeneratedColumn>,
}

/// Table registry: the entry point the host engine calls to bind a named
/// table. Owns the schema cache for the process and orchestrates its
/// lookup, population and validation.
pub struct TableModule {
    generator: Arc<dyn Generator>,
    renderer: Arc<dyn PromptRenderer>,
    schema_cache: Arc<SchemaCache>,
    data_cache: Arc<DataCache>,
}

impl TableModule {
    /// Create a module over an explicit generator, renderer and data cache
    pub fn new(
        generator: Arc<dyn Generator>,
        renderer: Arc<dyn PromptRenderer>,
        data_cache: Arc<DataCache>,
    ) -> Self {
        Self {
            generator,
            renderer,
            schema_cache: Arc::new(SchemaCache::new()),
            data_cache,
        }
    }

    /// Create a module from engine configuration, backed by the OpenAI
    /// generator and the template renderer
    pub fn from_config(config: &EngineConfig) -> MirageResult<Self> {
        let generator = Arc::new(OpenAiGenerator::from_config(config.generator.clone())?);
        let renderer = Arc::new(TemplateRenderer::from_config(&config.prompts)?);
        let data_cache = Arc::new(DataCache::from_config(&config.cache));

        Ok(Self::new(generator, renderer, data_cache))
    }

    /// The module's schema cache
    pub fn schema_cache(&self) -> &SchemaCache {
        &self.schema_cache
    }

    /// The module's data cache
    pub fn data_cache(&self) -> &DataCache {
        &self.data_cache
    }
}

#[async_trait]
impl Resolvable for TableModule {
    type Handle = ResolvedTable;

    async fn resolve(
        &self,
        table_name: &str,
        table_description: &str,
    ) -> MirageResult<ResolvedTable> {
        let generator = Arc::clone(&self.generator);
        let prompt = self
            .renderer
            .render_schema_prompt(table_name, table_description);
        let table = table_name.to_string();

        let columns = self
            .schema_cache
            .get_or_resolve(table_name, async move {
                let request = GenerationRequest::new(
                    prompt,
                    output_shape::SCHEMA_SHAPE_NAME,
                    output_shape::schema_shape(),
                );
                let payload = generator
                    .generate(request)
                    .await
                    .map_err(SchemaError::Generator)?;

                Ok(validate_schema(&table, payload)?)
            })
            .await?;

        Ok(ResolvedTable::new(
            table_name,
            table_description,
            columns,
            Arc::clone(&self.generator),
            Arc::clone(&self.renderer),
            Arc::clone(&self.data_cache),
        ))
    }
}

/// Validate a raw generator schema response into a usable column set
fn validate_schema(table_name: &str, payload: JsonValue) -> Result<Vec<ColumnDef>, SchemaError> {
    let response: SchemaResponse = serde_json::from_value(payload).map_err(|e| {
        SchemaError::Generator(GeneratorError::MalformedPayload(format!(
            "schema response does not match the requested shape: {}",
            e
        )))
    })?;

    if response.columns.is_empty() {
        return Err(SchemaError::EmptySchema(table_name.to_string()));
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(response.columns.len());

    for generated in response.columns {
        if generated.name.is_empty() || !seen.insert(generated.name.clone()) {
            return Err(SchemaError::DuplicateColumn {
                table: table_name.to_string(),
                column: generated.name,
            });
        }

        let column_type =
            generated
                .column_type
                .parse::<ColumnType>()
                .map_err(|_| SchemaError::InvalidType {
                    table: table_name.to_string(),
                    column: generated.name.clone(),
                    found: generated.column_type.clone(),
                })?;

        columns.push(ColumnDef {
            name: generated.name,
            column_type,
            constraints: generated.constraints,
            description: generated.description,
        });
    }

    Ok(columns)
}
