//! Deterministic mock [`LanguageModel`] for tests: returns scripted
//! responses keyed by a substring of the last user message, falling
//! back to an echo of the prompt. No network access.

use async_trait::async_trait;
use parking_lot::Mutex;

use research_core::{ChatMessage, ChatParams, LanguageModel, Result};

pub struct MockLanguageModel {
    scripts: Vec<(String, String)>,
    calls: Mutex<Vec<String>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register a canned response returned when the last user
    /// message contains `trigger`. First match wins.
    pub fn with_script(mut self, trigger: impl Into<String>, response: impl Into<String>) -> Self {
        self.scripts.push((trigger.into(), response.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn chat(&self, _model: &str, messages: &[ChatMessage], _params: ChatParams) -> Result<String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == research_core::Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        self.calls.lock().push(last_user.to_string());

        for (trigger, response) in &self.scripts {
            if last_user.contains(trigger.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(format!("mock response to: {last_user}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_scripted_response_on_trigger_match() {
        let model = MockLanguageModel::new().with_script("gold price", "42 per gram");
        let out = model
            .chat("any", &[ChatMessage::user("what is the gold price today?")], ChatParams::default())
            .await
            .unwrap();
        assert_eq!(out, "42 per gram");
    }

    #[tokio::test]
    async fn falls_back_to_echo() {
        let model = MockLanguageModel::new();
        let out = model
            .chat("any", &[ChatMessage::user("unmatched query")], ChatParams::default())
            .await
            .unwrap();
        assert!(out.contains("unmatched query"));
    }
}
