use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use url::Url;

use crate::generator::generator_trait::{GenerationRequest, Generator};
use crate::utils::{
    config::GeneratorConfig,
    error::{GeneratorError, MirageError, MirageResult},
    types::GeneratorKind,
};

/// Generator client for OpenAI-compatible chat completion endpoints.
///
/// Sends one structured-output request per call and parses the message
/// content back into JSON. Credentials are resolved per call so that a key
/// exported after startup is picked up without a restart.
pub struct OpenAiGenerator {
    client: Client,
    endpoint: Url,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    /// Build a client from generator configuration
    pub fn from_config(config: GeneratorConfig) -> MirageResult<Self> {
        let endpoint = Self::completions_endpoint(&config.api_base)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                MirageError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Resolve the chat completions endpoint under the configured base URL
    fn completions_endpoint(api_base: &str) -> MirageResult<Url> {
        let mut base = api_base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let base = Url::parse(&base).map_err(|e| {
            MirageError::Configuration(format!("invalid generator api_base '{}': {}", api_base, e))
        })?;

        base.join("chat/completions").map_err(|e| {
            MirageError::Configuration(format!("invalid generator api_base '{}': {}", api_base, e))
        })
    }

    /// Expose the resolved endpoint, mainly for diagnostics
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<JsonValue, GeneratorError> {
        let api_key = self.config.resolve_api_key().ok_or_else(|| {
            GeneratorError::MissingCredentials(format!("{} not set", self.config.api_key_env))
        })?;

        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": request.prompt}
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.shape_name,
                    "strict": true,
                    "schema": request.output_shape
                }
            }
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::RequestFailed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GeneratorError::BadStatus {
                status: status.as_u16(),
                detail,
            });
        }

        let payload: JsonValue = response.json().await.map_err(|e| {
            GeneratorError::MalformedPayload(format!("response body is not JSON: {}", e))
        })?;

        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                GeneratorError::MalformedPayload("response carries no message content".to_string())
            })?;

        serde_json::from_str(content).map_err(|e| {
            GeneratorError::MalformedPayload(format!("message content is not valid JSON: {}", e))
        })
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::OpenAi
    }
}
