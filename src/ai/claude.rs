use crate::ai::types::{
    AiResponse, ClaudeContentBlock, ClaudeMessage as TypedClaudeMessage, ClaudeMessageContent,
    ClaudeTool, ToolCall,
};
use crate::ai::{Message, MessageRole};
use crate::tools::ToolDefinition;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Client for the Anthropic Messages API with native tool calling
#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ClaudeToolRequest {
    model: String,
    messages: Vec<TypedClaudeMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ClaudeTool>>,
}

#[derive(Debug, Deserialize)]
struct ClaudeCompletionResponse {
    content: Vec<ClaudeResponseContent>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
    error: ClaudeError,
}

#[derive(Debug, Deserialize)]
struct ClaudeError {
    message: String,
}

impl ClaudeClient {
    pub fn new(
        api_key: &str,
        endpoint: Option<&str>,
        model: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<Self, String> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let auth_value = header::HeaderValue::from_str(api_key)
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        auth_headers.insert("x-api-key", auth_value);
        auth_headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static("2023-06-01"),
        );

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint: endpoint
                .unwrap_or("https://api.anthropic.com/v1/messages")
                .to_string(),
            model: model.unwrap_or("claude-sonnet-4-20250514").to_string(),
            max_tokens: max_tokens.unwrap_or(4096),
        })
    }

    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        let response = self.generate_with_tools(messages, vec![], vec![]).await?;
        if response.content.is_empty() {
            return Err("Claude API returned no content".to_string());
        }
        Ok(response.content)
    }

    /// Generate a response with the tool catalogue bound. `tool_messages`
    /// carries earlier rounds of tool_use / tool_result blocks.
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tool_messages: Vec<TypedClaudeMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, String> {
        // The Messages API takes the system prompt out-of-band
        let mut system_message = None;
        let mut api_messages: Vec<TypedClaudeMessage> = Vec::new();
        for m in messages {
            if m.role == MessageRole::System {
                system_message = Some(m.content);
            } else {
                api_messages.push(TypedClaudeMessage {
                    role: m.role.to_string(),
                    content: ClaudeMessageContent::Text(m.content),
                });
            }
        }
        api_messages.extend(tool_messages);

        let claude_tools: Vec<ClaudeTool> = tools
            .into_iter()
            .map(|t| ClaudeTool {
                name: t.name,
                description: t.description,
                input_schema: serde_json::to_value(t.input_schema).unwrap_or_default(),
            })
            .collect();

        let request = ClaudeToolRequest {
            model: self.model.clone(),
            messages: api_messages,
            max_tokens: self.max_tokens,
            system: system_message,
            tools: if claude_tools.is_empty() {
                None
            } else {
                Some(claude_tools)
            },
        };

        log::debug!("Sending request to Claude API: {:?}", request);

        // Retry configuration for transient errors
        const MAX_RETRIES: u32 = 3;
        const BASE_DELAY_MS: u64 = 2000;

        let mut last_error: Option<String> = None;
        let mut response_data_opt: Option<ClaudeCompletionResponse> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "[CLAUDE] Retry attempt {}/{} after {}ms delay",
                    attempt,
                    MAX_RETRIES,
                    delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let request_result = self
                .client
                .post(&self.endpoint)
                .headers(self.auth_headers.clone())
                .json(&request)
                .send()
                .await;

            let response = match request_result {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(format!("Claude API request failed: {}", e));
                    if attempt < MAX_RETRIES {
                        log::warn!(
                            "[CLAUDE] Request failed (attempt {}): {}, will retry",
                            attempt + 1,
                            e
                        );
                        continue;
                    }
                    return Err(last_error.unwrap());
                }
            };

            let status = response.status();
            let is_retryable = matches!(status.as_u16(), 429 | 502 | 503 | 504);

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();

                if is_retryable && attempt < MAX_RETRIES {
                    log::warn!(
                        "[CLAUDE] Received retryable status {} (attempt {}), will retry",
                        status,
                        attempt + 1
                    );
                    last_error = Some(format!("HTTP {}: {}", status, error_text));
                    continue;
                }

                if let Ok(error_response) = serde_json::from_str::<ClaudeErrorResponse>(&error_text)
                {
                    return Err(format!("Claude API error: {}", error_response.error.message));
                }

                return Err(format!(
                    "Claude API returned error status: {}, body: {}",
                    status, error_text
                ));
            }

            response_data_opt = Some(
                response
                    .json()
                    .await
                    .map_err(|e| format!("Failed to parse Claude response: {}", e))?,
            );
            break;
        }

        let response_data = response_data_opt
            .ok_or_else(|| last_error.unwrap_or_else(|| "Max retries exceeded".to_string()))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in response_data.content {
            match block.content_type.as_str() {
                "text" => {
                    if let Some(text) = block.text {
                        content.push_str(&text);
                    }
                }
                "tool_use" => {
                    if let (Some(id), Some(name)) = (block.id, block.name) {
                        tool_calls.push(ToolCall {
                            id,
                            name,
                            arguments: block.input.unwrap_or(Value::Null),
                        });
                    }
                }
                other => log::debug!("[CLAUDE] Ignoring content block of type {}", other),
            }
        }

        Ok(AiResponse {
            content,
            tool_calls,
            stop_reason: response_data.stop_reason,
        })
    }

    /// Build tool-round messages for continuing conversation after tool
    /// execution: one assistant message carrying the tool_use blocks, one
    /// user message carrying the tool_result blocks.
    pub fn build_tool_result_messages(
        tool_calls: &[ToolCall],
        tool_responses: &[crate::ai::ToolResponse],
    ) -> Vec<TypedClaudeMessage> {
        let tool_use_blocks: Vec<ClaudeContentBlock> = tool_calls
            .iter()
            .map(|tc| ClaudeContentBlock::ToolUse {
                id: tc.id.clone(),
                name: tc.name.clone(),
                input: tc.arguments.clone(),
            })
            .collect();

        let result_blocks: Vec<ClaudeContentBlock> = tool_responses
            .iter()
            .map(|tr| {
                ClaudeContentBlock::tool_result(
                    tr.tool_call_id.clone(),
                    tr.content.clone(),
                    tr.is_error,
                )
            })
            .collect();

        vec![
            TypedClaudeMessage::assistant_with_blocks(tool_use_blocks),
            TypedClaudeMessage::user_with_tool_results(result_blocks),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_api_key() {
        assert!(ClaudeClient::new("bad\nkey", None, None, None).is_err());
        assert!(ClaudeClient::new("sk-ant-ok", None, None, None).is_ok());
    }

    #[test]
    fn test_tool_result_messages_shape() {
        let calls = vec![ToolCall {
            id: "toolu_1".to_string(),
            name: "list_tasks".to_string(),
            arguments: serde_json::json!({}),
        }];
        let responses = vec![crate::ai::ToolResponse::success(
            "toolu_1".to_string(),
            "No tasks found for current user".to_string(),
        )];

        let messages = ClaudeClient::build_tool_result_messages(&calls, &responses);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "assistant");
        assert_eq!(messages[1].role, "user");

        let json = serde_json::to_value(&messages[1]).unwrap();
        assert_eq!(json["content"][0]["type"], "tool_result");
        assert_eq!(json["content"][0]["tool_use_id"], "toolu_1");
    }
}
