//! Generation provider trait and message types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Role of a message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a generation call
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        // Low temperature, bounded length: factual answers over creative ones
        Self {
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

/// Trait for text generation providers.
///
/// Exposes the two call conventions the answer fallback chain alternates
/// between: a single-prompt completion and a message-list chat call.
#[async_trait]
pub trait GenerationProvider: Send + Sync + Debug {
    /// Single-prompt completion call
    async fn respond(
        &self,
        model: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, DomainError>;

    /// Message-list chat completion call
    async fn chat(
        &self,
        model: &str,
        messages: Vec<Message>,
        params: GenerationParams,
    ) -> Result<String, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Recorded generation call, for asserting what each tier received
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RecordedCall {
        Respond { model: String, prompt: String },
        Chat { model: String, user_content: String },
    }

    #[derive(Debug)]
    pub struct MockGenerationProvider {
        name: &'static str,
        respond_result: Result<String, String>,
        chat_result: Result<String, String>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl MockGenerationProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                respond_result: Ok("mock completion".to_string()),
                chat_result: Ok("mock chat completion".to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_respond_response(mut self, response: impl Into<String>) -> Self {
            self.respond_result = Ok(response.into());
            self
        }

        pub fn with_respond_error(mut self, error: impl Into<String>) -> Self {
            self.respond_result = Err(error.into());
            self
        }

        pub fn with_chat_response(mut self, response: impl Into<String>) -> Self {
            self.chat_result = Ok(response.into());
            self
        }

        pub fn with_chat_error(mut self, error: impl Into<String>) -> Self {
            self.chat_result = Err(error.into());
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationProvider for MockGenerationProvider {
        async fn respond(
            &self,
            model: &str,
            prompt: &str,
            _params: GenerationParams,
        ) -> Result<String, DomainError> {
            self.calls.lock().unwrap().push(RecordedCall::Respond {
                model: model.to_string(),
                prompt: prompt.to_string(),
            });

            self.respond_result
                .clone()
                .map_err(|e| DomainError::provider(self.name, e))
        }

        async fn chat(
            &self,
            model: &str,
            messages: Vec<Message>,
            _params: GenerationParams,
        ) -> Result<String, DomainError> {
            let user_content = messages
                .iter()
                .filter(|m| m.role == MessageRole::User)
                .map(|m| m.content.clone())
                .collect::<Vec<_>>()
                .join("\n");

            self.calls.lock().unwrap().push(RecordedCall::Chat {
                model: model.to_string(),
                user_content,
            });

            self.chat_result
                .clone()
                .map_err(|e| DomainError::provider(self.name, e))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::system("You are a helpful financial research assistant.");

        assert_eq!(msg.role, MessageRole::System);
        assert!(msg.content.starts_with("You are"));
    }

    #[test]
    fn test_default_params() {
        let params = GenerationParams::default();

        assert!((params.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(params.max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_mock_provider_records_calls() {
        use mock::{MockGenerationProvider, RecordedCall};

        let provider = MockGenerationProvider::new("mock");

        provider
            .respond("gpt-4.1", "prompt text", GenerationParams::default())
            .await
            .unwrap();
        provider
            .chat(
                "gpt-3.5-turbo",
                vec![Message::user("question")],
                GenerationParams::default(),
            )
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            RecordedCall::Respond {
                model: "gpt-4.1".into(),
                prompt: "prompt text".into()
            }
        );
    }
}
