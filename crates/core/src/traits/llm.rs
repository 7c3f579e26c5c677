//! `LanguageModel` — the consumed LLM capability (§6).
//!
//! Mirrors `Chat`/`StructuredChat` from the spec: free-text generation
//! plus a structured-output path that decodes into a caller-supplied
//! JSON shape, with the caller responsible for the fallback on parse
//! failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Base64-encoded inline images, for multimodal key-finding
    /// extraction (§4.4).
    #[serde(default)]
    pub images: Vec<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, image_base64: impl Into<String>) -> Self {
        self.images.push(image_base64.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChatParams {
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.2,
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-text chat completion.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: ChatParams,
    ) -> Result<String>;

    /// Structured-output call. Returns the raw JSON text; callers
    /// parse into their own typed shell and fall back on error.
    async fn structured_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        schema_hint: &str,
    ) -> Result<String> {
        // Default implementation: most backends don't have a native
        // structured mode, so ask for JSON in the prompt and let the
        // caller parse/fall back. Backends with native structured
        // output (e.g. tool-enforced JSON) should override this.
        let mut augmented = messages.to_vec();
        augmented.push(ChatMessage::system(format!(
            "Respond with JSON matching this shape, and nothing else: {schema_hint}"
        )));
        self.chat(model, &augmented, ChatParams {
            temperature: 0.0,
            ..ChatParams::default()
        })
        .await
    }
}
