//! Claude backend: implements [`research_core::LanguageModel`] against
//! the Anthropic Messages API, including multimodal (text + inline
//! image) messages for `DocumentAnalyzer`'s key-finding extraction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use research_core::{ChatMessage, ChatParams, LanguageModel, Role};

use crate::LlmError;

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub timeout: Duration,
    pub endpoint: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(60),
            endpoint: "https://api.anthropic.com".to_string(),
        }
    }
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn convert_messages(&self, messages: &[ChatMessage]) -> Vec<ClaudeMessage> {
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => unreachable!(),
                };
                let content = if m.images.is_empty() {
                    ClaudeContent::Text(m.content.clone())
                } else {
                    let mut blocks: Vec<ClaudeContentBlock> = m
                        .images
                        .iter()
                        .map(|data| ClaudeContentBlock::Image {
                            source: ClaudeImageSource {
                                source_type: "base64".to_string(),
                                media_type: "image/png".to_string(),
                                data: data.clone(),
                            },
                        })
                        .collect();
                    blocks.push(ClaudeContentBlock::Text {
                        text: m.content.clone(),
                    });
                    ClaudeContent::Blocks(blocks)
                };
                ClaudeMessage {
                    role: role.to_string(),
                    content,
                }
            })
            .collect()
    }

    fn system_prompt(&self, messages: &[ChatMessage]) -> Option<String> {
        let systems: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if systems.is_empty() {
            None
        } else {
            Some(systems.join("\n\n"))
        }
    }
}

#[async_trait]
impl LanguageModel for ClaudeBackend {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: ChatParams,
    ) -> research_core::Result<String> {
        let request = ClaudeRequest {
            model: model.to_string(),
            max_tokens: params.max_tokens,
            messages: self.convert_messages(messages),
            system: self.system_prompt(messages),
            temperature: Some(params.temperature),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {status}: {body}")).into());
        }

        let parsed: ClaudeApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text),
                ClaudeContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: ClaudeContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ClaudeContent {
    Text(String),
    Blocks(Vec<ClaudeContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text { text: String },
    Image { source: ClaudeImageSource },
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaudeImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContentBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_env_key() {
        let config = ClaudeConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
    }

    #[test]
    fn request_with_image_serializes_blocks() {
        let msg = ChatMessage::user("describe this page").with_image("aGVsbG8=");
        let backend = ClaudeBackend {
            config: ClaudeConfig::new("k"),
            client: Client::new(),
        };
        let converted = backend.convert_messages(std::slice::from_ref(&msg));
        match &converted[0].content {
            ClaudeContent::Blocks(blocks) => assert_eq!(blocks.len(), 2),
            ClaudeContent::Text(_) => panic!("expected multimodal blocks"),
        }
    }

    #[test]
    fn system_messages_are_joined() {
        let backend = ClaudeBackend {
            config: ClaudeConfig::new("k"),
            client: Client::new(),
        };
        let messages = vec![ChatMessage::system("a"), ChatMessage::system("b")];
        assert_eq!(backend.system_prompt(&messages), Some("a\n\nb".to_string()));
    }
}
