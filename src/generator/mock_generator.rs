use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

use crate::generator::generator_trait::{GenerationRequest, Generator};
use crate::generator::output_shape::{DATA_SHAPE_NAME, SCHEMA_SHAPE_NAME};
use crate::utils::{error::GeneratorError, types::GeneratorKind};

/// Mock generator with deterministic canned responses for testing.
///
/// Responses are keyed by shape name, so one instance can serve both the
/// schema and the data phase of a table. Invocations are counted and the
/// rendered prompts recorded for assertions.
pub struct MockGenerator {
    responses: HashMap<String, JsonValue>,
    failure: Option<GeneratorError>,
    delay_ms: u64,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Create a mock with a small consistent default table: three columns,
    /// three rows
    pub fn new() -> Self {
        let mut responses = HashMap::new();
        responses.insert(
            SCHEMA_SHAPE_NAME.to_string(),
            json!({
                "columns": [
                    {"name": "id", "type": "INTEGER", "constraints": "PRIMARY KEY", "description": "Row identifier"},
                    {"name": "name", "type": "TEXT", "constraints": "", "description": "Display name"},
                    {"name": "score", "type": "REAL", "constraints": "", "description": "Arbitrary score"}
                ]
            }),
        );
        responses.insert(
            DATA_SHAPE_NAME.to_string(),
            json!({
                "rows": [
                    {"id": 1, "name": "Alice Johnson", "score": 9.5},
                    {"id": 2, "name": "Bob Smith", "score": 7.25},
                    {"id": 3, "name": "Charlie Brown", "score": 4.0}
                ]
            }),
        );

        Self {
            responses,
            failure: None,
            delay_ms: 0,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replace the canned schema response
    pub fn with_schema_response(mut self, response: JsonValue) -> Self {
        self.responses.insert(SCHEMA_SHAPE_NAME.to_string(), response);
        self
    }

    /// Replace the canned data response
    pub fn with_data_response(mut self, response: JsonValue) -> Self {
        self.responses.insert(DATA_SHAPE_NAME.to_string(), response);
        self
    }

    /// Make every call fail with the given error
    pub fn with_failure(mut self, failure: GeneratorError) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Delay every call, useful for exercising concurrent coalescing
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Number of generate calls observed so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts observed so far, in call order
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<JsonValue, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }

        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        self.responses
            .get(&request.shape_name)
            .cloned()
            .ok_or_else(|| {
                GeneratorError::RequestFailed(format!(
                    "no canned response for shape '{}'",
                    request.shape_name
                ))
            })
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Mock
    }
}
