use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::utils::{error::GeneratorError, types::GeneratorKind};

/// One request to the generative service: a rendered prompt plus the JSON
/// shape the response must conform to
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Name attached to the output shape, e.g. `table_schema`
    pub shape_name: String,
    /// JSON Schema description of the required response shape
    pub output_shape: JsonValue,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(prompt: String, shape_name: &str, output_shape: JsonValue) -> Self {
        Self {
            prompt,
            shape_name: shape_name.to_string(),
            output_shape,
        }
    }
}

/// Boundary to the external generative service.
///
/// A single request/response exchange: the returned value already conforms
/// to the requested shape, or the call fails. No retries at this layer.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a structured JSON value conforming to the requested shape
    async fn generate(&self, request: GenerationRequest) -> Result<JsonValue, GeneratorError>;

    /// Identify the backing implementation
    fn kind(&self) -> GeneratorKind;
}
