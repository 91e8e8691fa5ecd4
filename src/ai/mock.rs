//! Scripted AI client used by tests and offline runs.

use crate::ai::types::{AiResponse, ToolHistoryEntry};
use crate::ai::Message;
use crate::tools::ToolDefinition;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Mock AI client that replays a fixed sequence of responses.
///
/// Once the script runs dry it keeps returning a plain text response, so a
/// looping caller always terminates. An entry may also be an `Err` to
/// exercise failure paths.
pub struct MockAiClient {
    responses: Mutex<VecDeque<Result<AiResponse, String>>>,
    /// When set, every request gets this response regardless of the script
    repeat: Option<AiResponse>,
}

impl MockAiClient {
    pub fn new(responses: Vec<Result<AiResponse, String>>) -> Self {
        MockAiClient {
            responses: Mutex::new(responses.into_iter().collect()),
            repeat: None,
        }
    }

    /// A client that returns the same response forever (used to exercise
    /// the round-trip cap)
    pub fn repeating(response: AiResponse) -> Self {
        MockAiClient {
            responses: Mutex::new(VecDeque::new()),
            repeat: Some(response),
        }
    }

    pub async fn generate_with_tools(
        &self,
        _messages: Vec<Message>,
        _tool_history: Vec<ToolHistoryEntry>,
        _tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, String> {
        if let Some(ref fixed) = self.repeat {
            return Ok(fixed.clone());
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(AiResponse::text("Okay.".to_string())))
    }

    pub async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        self.generate_with_tools(messages, vec![], vec![])
            .await
            .map(|r| r.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::ToolCall;

    #[tokio::test]
    async fn test_mock_replays_script_then_defaults() {
        let mock = MockAiClient::new(vec![
            Ok(AiResponse::text("first".to_string())),
            Err("model down".to_string()),
        ]);

        let first = mock.generate_with_tools(vec![], vec![], vec![]).await.unwrap();
        assert_eq!(first.content, "first");

        let second = mock.generate_with_tools(vec![], vec![], vec![]).await;
        assert!(second.is_err());

        let third = mock.generate_with_tools(vec![], vec![], vec![]).await.unwrap();
        assert_eq!(third.content, "Okay.");
    }

    #[tokio::test]
    async fn test_repeating_mock_never_runs_dry() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "list_tasks".to_string(),
            arguments: serde_json::json!({}),
        };
        let mock = MockAiClient::repeating(AiResponse::with_tools(String::new(), vec![call]));

        for _ in 0..20 {
            let response = mock.generate_with_tools(vec![], vec![], vec![]).await.unwrap();
            assert!(response.has_tool_calls());
        }
    }
}
