use std::path::Path;

use crate::utils::{
    config::PromptConfig,
    error::{MirageError, MirageResult},
};

/// Placeholder substituted with the table name during rendering
pub const TABLE_NAME_PLACEHOLDER: &str = "{table_name}";

/// Placeholder substituted with the table description during rendering
pub const TABLE_DESCRIPTION_PLACEHOLDER: &str = "{table_description}";

const DEFAULT_SCHEMA_TEMPLATE: &str = "Design a SQLite table schema for a table named '{table_name}'.\n\
Table description: {table_description}\n\
Return the complete column list for this table. Use lowercase column names \
without spaces and only the types INTEGER, TEXT, REAL or BLOB. Include SQL \
constraints where they make sense (e.g., PRIMARY KEY, NOT NULL, UNIQUE).";

const DEFAULT_DATA_TEMPLATE: &str = "Generate realistic example rows for the SQLite table '{table_name}'.\n\
Table description: {table_description}\n\
Return between 10 and 25 rows of plausible, varied data for this table. \
Every row must provide a value for every column.";

/// Produces the literal request text sent to the generator.
///
/// Rendering must be deterministic and embed both the table name and its
/// description, so repeated resolutions of the same table produce the same
/// prompt.
pub trait PromptRenderer: Send + Sync {
    /// Render the schema generation prompt for a table
    fn render_schema_prompt(&self, table_name: &str, table_description: &str) -> String;

    /// Render the data generation prompt for a table
    fn render_data_prompt(&self, table_name: &str, table_description: &str) -> String;
}

/// Renderer substituting placeholders in plain text templates
pub struct TemplateRenderer {
    schema_template: String,
    data_template: String,
}

impl TemplateRenderer {
    /// Create a renderer with the built-in templates
    pub fn new() -> Self {
        Self {
            schema_template: DEFAULT_SCHEMA_TEMPLATE.to_string(),
            data_template: DEFAULT_DATA_TEMPLATE.to_string(),
        }
    }

    /// Create a renderer from configuration, loading template files where
    /// configured and falling back to the built-in templates otherwise
    pub fn from_config(config: &PromptConfig) -> MirageResult<Self> {
        let schema_template = match &config.schema_template_file {
            Some(path) => Self::load_template(path)?,
            None => DEFAULT_SCHEMA_TEMPLATE.to_string(),
        };
        let data_template = match &config.data_template_file {
            Some(path) => Self::load_template(path)?,
            None => DEFAULT_DATA_TEMPLATE.to_string(),
        };

        Self::from_templates(schema_template, data_template)
    }

    /// Create a renderer from explicit template text
    pub fn from_templates(
        schema_template: impl Into<String>,
        data_template: impl Into<String>,
    ) -> MirageResult<Self> {
        let schema_template = schema_template.into();
        let data_template = data_template.into();

        for (label, template) in [("schema", &schema_template), ("data", &data_template)] {
            if !template.contains(TABLE_NAME_PLACEHOLDER)
                || !template.contains(TABLE_DESCRIPTION_PLACEHOLDER)
            {
                return Err(MirageError::Configuration(format!(
                    "{} prompt template must contain both {} and {}",
                    label, TABLE_NAME_PLACEHOLDER, TABLE_DESCRIPTION_PLACEHOLDER
                )));
            }
        }

        Ok(Self {
            schema_template,
            data_template,
        })
    }

    fn load_template(path: &Path) -> MirageResult<String> {
        std::fs::read_to_string(path).map_err(|e| {
            MirageError::Configuration(format!(
                "failed to read prompt template {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn render(template: &str, table_name: &str, table_description: &str) -> String {
        template
            .replace(TABLE_NAME_PLACEHOLDER, table_name)
            .replace(TABLE_DESCRIPTION_PLACEHOLDER, table_description)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer for TemplateRenderer {
    fn render_schema_prompt(&self, table_name: &str, table_description: &str) -> String {
        Self::render(&self.schema_template, table_name, table_description)
    }

    fn render_data_prompt(&self, table_name: &str, table_description: &str) -> String {
        Self::render(&self.data_template, table_name, table_description)
    }
}
