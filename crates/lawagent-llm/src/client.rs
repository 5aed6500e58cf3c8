//! Typed wrapper over an OpenAI-compatible chat-completions endpoint (C1).

use std::time::Duration;

use lawagent_core::{CoreError, Message, Result};
use tracing::{debug, instrument, warn};

use crate::retry::with_retry;
use crate::types::{
    ChatChoice, ChatRequestBody, ChatResponseBody, ToolChatResponse, ToolChoice, ToolSchema,
};

/// Static configuration for an [`LlmClient`].
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl LlmClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: 3,
            timeout: Duration::from_secs(120),
        }
    }
}

/// A chat-completions client. Cheaply cloneable (holds an `Arc`-backed
/// `reqwest::Client` internally).
#[derive(Clone)]
pub struct LlmClient {
    config: LlmClientConfig,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }

    /// Plain chat, no tools.
    #[instrument(skip(self, messages, system), fields(model = %self.config.model, n_messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: &[Message],
        system: Option<&str>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let resp = self
            .chat_inner(messages, system, temperature, max_tokens, None, None)
            .await?;
        Ok(resp.content)
    }

    /// Chat with tool-calling enabled. An empty `tool_calls` vector is a
    /// valid, final textual answer.
    #[instrument(skip(self, messages, tools_schema), fields(model = %self.config.model, n_messages = messages.len(), n_tools = tools_schema.len()))]
    pub async fn chat_with_tools(
        &self,
        messages: &[Message],
        tools_schema: &[ToolSchema],
        tool_choice: ToolChoice,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<ToolChatResponse> {
        self.chat_inner(
            messages,
            None,
            temperature,
            max_tokens,
            Some(tools_schema),
            Some(tool_choice),
        )
        .await
    }

    async fn chat_inner(
        &self,
        messages: &[Message],
        system: Option<&str>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
        tools: Option<&[ToolSchema]>,
        tool_choice: Option<ToolChoice>,
    ) -> Result<ToolChatResponse> {
        let full_messages = self.build_messages(messages, system);
        let body = ChatRequestBody {
            model: self.config.model.clone(),
            messages: full_messages,
            temperature,
            max_tokens,
            tools: tools.map(|t| t.to_vec()),
            tool_choice,
        };

        with_retry(self.config.max_retries, || self.send_request(&body)).await
    }

    /// Prepend the system prompt (if any) and prune orphan tool messages
    /// before sending.
    fn build_messages(&self, messages: &[Message], system: Option<&str>) -> Vec<Message> {
        let pruned = lawagent_core::prune_orphan_tool_messages(messages);
        match system {
            Some(sys) if !sys.is_empty() => {
                let mut out = Vec::with_capacity(pruned.len() + 1);
                out.push(Message::system(sys));
                out.extend(pruned);
                out
            }
            _ => pruned,
        }
    }

    async fn send_request(&self, body: &ChatRequestBody) -> Result<ToolChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response = tokio::time::timeout(
            self.config.timeout,
            self.http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(body)
                .send(),
        )
        .await
        .map_err(|_| CoreError::Timeout {
            seconds: self.config.timeout.as_secs(),
            detail: "llm chat request".to_string(),
        })?
        .map_err(|e| CoreError::provider(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "llm provider returned non-2xx");
            return Err(CoreError::provider(format!("http {status}: {text}")));
        }

        let parsed: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| CoreError::provider(format!("invalid response body: {e}")))?;

        let choice: &ChatChoice = parsed
            .choices
            .first()
            .ok_or_else(|| CoreError::provider("empty choices array"))?;

        debug!(usage = ?parsed.usage, "llm chat completed");

        Ok(ToolChatResponse {
            content: choice.message.content.clone().unwrap_or_default(),
            tool_calls: choice.message.tool_calls.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_messages_prepends_system_and_prunes_orphans() {
        let client = LlmClient::new(LlmClientConfig::new("http://x", "key", "model"));
        let messages = vec![
            Message::user("hi"),
            Message::tool("orphan", "missing_call", "web_search"),
        ];
        let built = client.build_messages(&messages, Some("be terse"));
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].content, "be terse");
        assert_eq!(built[1].content, "hi");
    }

    #[test]
    fn build_messages_without_system_skips_prepend() {
        let client = LlmClient::new(LlmClientConfig::new("http://x", "key", "model"));
        let messages = vec![Message::user("hi")];
        let built = client.build_messages(&messages, None);
        assert_eq!(built.len(), 1);
    }
}
