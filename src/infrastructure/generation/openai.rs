//! OpenAI generation provider implementation
//!
//! Implements both call conventions of [`GenerationProvider`]: `respond` goes
//! through the Responses API, `chat` through Chat Completions. The answer
//! fallback chain uses the former for the primary tier and the latter for the
//! secondary tier.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::generation::{GenerationParams, GenerationProvider, Message, MessageRole};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI generation provider
#[derive(Debug)]
pub struct OpenAiGenerationProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiGenerationProvider<C> {
    /// Create a new OpenAI generation provider
    pub fn new(client: C, api_key: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    /// Create a new provider with custom base URL
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(DomainError::configuration(
                "OpenAI API key is required (set OPENAI_API_KEY)",
            ));
        }

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", api_key),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn responses_url(&self) -> String {
        format!("{}/v1/responses", self.base_url)
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn role_str(role: &MessageRole) -> &'static str {
        match role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    fn parse_responses_api(json: serde_json::Value) -> Result<String, DomainError> {
        let response: ResponsesApiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse response: {}", e))
        })?;

        // Prefer the flattened output_text when the API provides it
        if let Some(text) = response.output_text {
            return Ok(text.trim().to_string());
        }

        response
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .find_map(|part| part.text.clone())
            .map(|t| t.trim().to_string())
            .ok_or_else(|| DomainError::provider("openai", "Response contained no output text"))
    }

    fn parse_chat_completions(json: serde_json::Value) -> Result<String, DomainError> {
        let response: ChatCompletionsResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse response: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| DomainError::provider("openai", "Response contained no choices"))
    }
}

#[async_trait]
impl<C: HttpClientTrait> GenerationProvider for OpenAiGenerationProvider<C> {
    async fn respond(
        &self,
        model: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, DomainError> {
        let body = serde_json::json!({
            "model": model,
            "input": prompt,
            "temperature": params.temperature,
            "max_output_tokens": params.max_tokens,
        });

        let response = self
            .client
            .post_json(&self.responses_url(), self.headers(), &body)
            .await?;

        Self::parse_responses_api(response)
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<Message>,
        params: GenerationParams,
    ) -> Result<String, DomainError> {
        let messages_json: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": Self::role_str(&m.role),
                    "content": m.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": model,
            "messages": messages_json,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        let response = self
            .client
            .post_json(&self.chat_completions_url(), self.headers(), &body)
            .await?;

        Self::parse_chat_completions(response)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ResponsesApiOutputItem>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiOutputItem {
    #[serde(default)]
    content: Vec<ResponsesApiContentPart>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatCompletionsChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsChoice {
    message: ChatCompletionsMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsMessage {
    content: String,
}
