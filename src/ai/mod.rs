pub mod claude;
pub mod mock;
pub mod openai;
pub mod types;

pub use claude::ClaudeClient;
pub use mock::MockAiClient;
pub use openai::{OpenAIClient, OpenAIMessage};
pub use types::{AiError, AiResponse, ToolCall, ToolHistoryEntry, ToolResponse};

use crate::config::ModelSettings;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Unified AI client that works with any configured provider
pub enum AiClient {
    Claude(ClaudeClient),
    OpenAI(OpenAIClient),
    Mock(MockAiClient),
}

impl AiClient {
    /// Create an AI client from model settings
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, String> {
        match settings.provider.to_lowercase().as_str() {
            "claude" | "anthropic" => {
                let client = ClaudeClient::new(
                    &settings.api_key,
                    settings.endpoint.as_deref(),
                    Some(&settings.model),
                    Some(settings.max_tokens),
                )?;
                Ok(AiClient::Claude(client))
            }
            // OpenAI-compatible endpoints (OpenRouter etc.) use the same client
            "openai" | "openai-compatible" | "openrouter" => {
                let client = OpenAIClient::new(
                    &settings.api_key,
                    settings.endpoint.as_deref(),
                    Some(&settings.model),
                    Some(settings.max_tokens),
                )?;
                Ok(AiClient::OpenAI(client))
            }
            other => Err(format!("Unknown provider: {}", other)),
        }
    }

    /// Generate text using the configured provider
    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        match self {
            AiClient::Claude(client) => client.generate_text(messages).await,
            AiClient::OpenAI(client) => client.generate_text(messages).await,
            AiClient::Mock(client) => client.generate_text(messages).await,
        }
    }

    /// Generate response with the tool catalogue bound as callable functions
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tool_history: Vec<ToolHistoryEntry>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, String> {
        match self {
            AiClient::Claude(client) => {
                let tool_messages = Self::tool_history_to_claude(&tool_history);
                client
                    .generate_with_tools(messages, tool_messages, tools)
                    .await
            }
            AiClient::OpenAI(client) => {
                let tool_messages = Self::tool_history_to_openai(&tool_history);
                client
                    .generate_with_tools(messages, tool_messages, tools)
                    .await
            }
            AiClient::Mock(client) => {
                client
                    .generate_with_tools(messages, tool_history, tools)
                    .await
            }
        }
    }

    /// Convert tool history to Claude block format
    fn tool_history_to_claude(history: &[ToolHistoryEntry]) -> Vec<types::ClaudeMessage> {
        let mut messages = Vec::new();
        for entry in history {
            messages.extend(ClaudeClient::build_tool_result_messages(
                &entry.tool_calls,
                &entry.tool_responses,
            ));
        }
        messages
    }

    /// Convert tool history to OpenAI message format
    fn tool_history_to_openai(history: &[ToolHistoryEntry]) -> Vec<OpenAIMessage> {
        let mut messages = Vec::new();
        for entry in history {
            messages.extend(OpenAIClient::build_tool_result_messages(
                &entry.tool_calls,
                &entry.tool_responses,
            ));
        }
        messages
    }
}
