use crate::ai::types::{AiResponse, ToolCall};
use crate::ai::Message;
use crate::tools::ToolDefinition;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Client for OpenAI-compatible chat-completions endpoints (OpenAI,
/// OpenRouter, and anything speaking the same wire format)
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIToolFunction,
}

#[derive(Debug, Serialize, Clone)]
struct OpenAIToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIFunctionCall {
    pub name: String,
    /// JSON-encoded argument object, per the OpenAI wire format
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

impl OpenAIClient {
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
        if !api_key.is_empty() {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?;
            auth_headers.insert(header::AUTHORIZATION, auth_value);
        }

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint: endpoint
                .unwrap_or("https://api.openai.com/v1/chat/completions")
                .to_string(),
            model: model.unwrap_or("gpt-4o-mini").to_string(),
            max_tokens: max_tokens.unwrap_or(4096),
        })
    }

    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        let response = self.generate_with_tools(messages, vec![], vec![]).await?;
        if response.content.is_empty() {
            return Err("OpenAI API returned no content".to_string());
        }
        Ok(response.content)
    }

    /// Generate a response with the tool catalogue bound. `tool_messages`
    /// carries earlier rounds of assistant tool_calls / tool results.
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tool_messages: Vec<OpenAIMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, String> {
        let mut api_messages: Vec<OpenAIMessage> = messages
            .into_iter()
            .map(|m| OpenAIMessage::text(m.role.to_string(), m.content))
            .collect();
        api_messages.extend(tool_messages);

        let openai_tools: Vec<OpenAITool> = tools
            .into_iter()
            .map(|t| OpenAITool {
                tool_type: "function".to_string(),
                function: OpenAIToolFunction {
                    name: t.name,
                    description: t.description,
                    parameters: serde_json::to_value(t.input_schema).unwrap_or_default(),
                },
            })
            .collect();

        let request = OpenAIChatRequest {
            model: self.model.clone(),
            messages: api_messages,
            max_tokens: self.max_tokens,
            tools: if openai_tools.is_empty() {
                None
            } else {
                Some(openai_tools)
            },
        };

        log::debug!("Sending request to OpenAI API: {:?}", request);

        // Retry configuration for transient errors
        const MAX_RETRIES: u32 = 3;
        const BASE_DELAY_MS: u64 = 2000;

        let mut last_error: Option<String> = None;
        let mut response_data_opt: Option<OpenAIChatResponse> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "[OPENAI] Retry attempt {}/{} after {}ms delay",
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
                    last_error = Some(format!("OpenAI API request failed: {}", e));
                    if attempt < MAX_RETRIES {
                        log::warn!(
                            "[OPENAI] Request failed (attempt {}): {}, will retry",
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
                        "[OPENAI] Received retryable status {} (attempt {}), will retry",
                        status,
                        attempt + 1
                    );
                    last_error = Some(format!("HTTP {}: {}", status, error_text));
                    continue;
                }

                if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&error_text)
                {
                    return Err(format!("OpenAI API error: {}", error_response.error.message));
                }

                return Err(format!(
                    "OpenAI API returned error status: {}, body: {}",
                    status, error_text
                ));
            }

            response_data_opt = Some(
                response
                    .json()
                    .await
                    .map_err(|e| format!("Failed to parse OpenAI response: {}", e))?,
            );
            break;
        }

        let response_data = response_data_opt
            .ok_or_else(|| last_error.unwrap_or_else(|| "Max retries exceeded".to_string()))?;

        let choice = response_data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "OpenAI API returned no choices".to_string())?;

        let mut tool_calls = Vec::new();
        if let Some(calls) = choice.message.tool_calls {
            for call in calls {
                // Arguments arrive as a JSON-encoded string
                let arguments = serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments.clone()));
                tool_calls.push(ToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments,
                });
            }
        }

        let stop_reason = if !tool_calls.is_empty() {
            Some("tool_use".to_string())
        } else {
            choice.finish_reason
        };

        Ok(AiResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            stop_reason,
        })
    }

    /// Build tool-round messages for continuing conversation after tool
    /// execution: one assistant message carrying the tool calls, then one
    /// `tool` role message per response.
    pub fn build_tool_result_messages(
        tool_calls: &[ToolCall],
        tool_responses: &[crate::ai::ToolResponse],
    ) -> Vec<OpenAIMessage> {
        let mut messages = Vec::new();

        let openai_tool_calls: Vec<OpenAIToolCall> = tool_calls
            .iter()
            .map(|tc| OpenAIToolCall {
                id: tc.id.clone(),
                call_type: "function".to_string(),
                function: OpenAIFunctionCall {
                    name: tc.name.clone(),
                    arguments: tc.arguments.to_string(),
                },
            })
            .collect();

        messages.push(OpenAIMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(openai_tool_calls),
            tool_call_id: None,
        });

        for response in tool_responses {
            messages.push(OpenAIMessage {
                role: "tool".to_string(),
                content: Some(response.content.clone()),
                tool_calls: None,
                tool_call_id: Some(response.tool_call_id.clone()),
            });
        }

        messages
    }
}
