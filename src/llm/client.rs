use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gateway::{GatewayError, LlmGateway, Prompt};
use super::parsing::decode_text_response;
use super::schema::ResponseSchema;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (FNOL_MODEL env var overrides the default)
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// API root, without the `/v1/messages` suffix
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        let mut config = Self::new(api_key, DEFAULT_MODEL.to_string());
        if let Ok(model) = std::env::var("FNOL_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        Ok(config)
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.0,
            max_tokens: 2048,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Anthropic API client
///
/// Every call forces a tool whose input schema is the expected response
/// schema, so the structured answer arrives as the tool input.
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmGateway for AnthropicClient {
    async fn invoke(
        &self,
        prompt: &Prompt,
        schema: &ResponseSchema,
    ) -> Result<serde_json::Value, GatewayError> {
        let request = AnthropicToolRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(prompt.system.clone()),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.user.clone(),
            }],
            tools: vec![Tool {
                name: schema.name.to_string(),
                description: schema.description.to_string(),
                input_schema: schema.schema.clone(),
            }],
            tool_choice: Some(ToolChoice {
                choice_type: "tool".to_string(),
                name: schema.name.to_string(),
            }),
        };

        debug!(
            claim = ?prompt.claim_id,
            tool = schema.name,
            "Sending request to {}",
            self.config.model
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to decode API response: {}", e)))?;

        if response.stop_reason.as_deref() == Some("refusal") {
            return Err(GatewayError::Declined(response.text()));
        }

        // Find the tool_use content block
        for content in &response.content {
            if content.content_type == "tool_use" && content.name.as_deref() == Some(schema.name) {
                if let Some(input) = &content.input {
                    return Ok(input.clone());
                }
            }
        }

        // Fall back to JSON embedded in a text answer
        decode_text_response(schema.name, &response.text())
    }
}

#[derive(Debug, Serialize)]
struct AnthropicToolRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

impl AnthropicResponse {
    /// Concatenated text blocks
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AnthropicConfig::new("key".into(), "model-x".into());
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.with_model("model-y").model, "model-y");
    }

    #[test]
    fn test_messages_url_trims_slash() {
        let mut config = AnthropicConfig::new("key".into(), "m".into());
        config.base_url = "http://localhost:8080/".into();
        let client = AnthropicClient::new(config).unwrap();
        assert_eq!(client.messages_url(), "http://localhost:8080/v1/messages");
    }

    #[test]
    fn test_parse_tool_use_response() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "name": "submit_assessment", "input": {"severity": "Minor", "estimated_cost": 300, "reasoning": "chip"}}
            ],
            "stop_reason": "tool_use"
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content[0].name.as_deref(), Some("submit_assessment"));
        assert_eq!(response.text(), "");
    }
}
