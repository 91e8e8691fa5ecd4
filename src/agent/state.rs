//! Per-invocation agent state: an append-only transcript plus the acting
//! user's handle. Never persisted; one `AgentState` lives exactly as long
//! as the invocation that created it.

use uuid::Uuid;

use crate::ai::{Message, ToolCall, ToolHistoryEntry, ToolResponse};

/// Role of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    User,
    Assistant,
    Tool,
}

/// One entry in the conversation transcript
#[derive(Debug, Clone)]
pub struct AgentMessage {
    pub role: AgentRole,
    pub content: String,
    /// Tool-call requests carried by an assistant message
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages: the call this result answers
    pub tool_call_id: Option<String>,
    /// For tool messages: whether the tool reported failure
    pub is_error: bool,
}

impl AgentMessage {
    pub fn user(content: impl Into<String>) -> Self {
        AgentMessage {
            role: AgentRole::User,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: None,
            is_error: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        AgentMessage {
            role: AgentRole::Assistant,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: None,
            is_error: false,
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        AgentMessage {
            role: AgentRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
            is_error: false,
        }
    }

    pub fn tool_result(tool_call_id: String, content: impl Into<String>, is_error: bool) -> Self {
        AgentMessage {
            role: AgentRole::Tool,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: Some(tool_call_id),
            is_error,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The state threaded through one orchestrator invocation
#[derive(Debug, Clone)]
pub struct AgentState {
    messages: Vec<AgentMessage>,
    pub user_id: Option<Uuid>,
}

impl AgentState {
    pub fn new(user_message: impl Into<String>, user_id: Uuid) -> Self {
        AgentState {
            messages: vec![AgentMessage::user(user_message)],
            user_id: Some(user_id),
        }
    }

    /// Append new messages; existing entries are never replaced
    pub fn append(&mut self, messages: Vec<AgentMessage>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[AgentMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&AgentMessage> {
        self.messages.last()
    }

    /// Split the transcript into plain chat messages plus tool-call rounds,
    /// the shape the provider clients consume. An assistant message carrying
    /// tool calls opens a round; the tool messages that follow it are that
    /// round's responses.
    pub fn to_model_input(&self) -> (Vec<Message>, Vec<ToolHistoryEntry>) {
        let mut base = Vec::new();
        let mut rounds = Vec::new();

        let mut i = 0;
        while i < self.messages.len() {
            let msg = &self.messages[i];
            match msg.role {
                AgentRole::User => {
                    base.push(Message::user(msg.content.clone()));
                    i += 1;
                }
                AgentRole::Assistant if !msg.has_tool_calls() => {
                    base.push(Message::assistant(msg.content.clone()));
                    i += 1;
                }
                AgentRole::Assistant => {
                    let mut responses = Vec::new();
                    let mut j = i + 1;
                    while j < self.messages.len() && self.messages[j].role == AgentRole::Tool {
                        let tool_msg = &self.messages[j];
                        let call_id = tool_msg.tool_call_id.clone().unwrap_or_default();
                        responses.push(if tool_msg.is_error {
                            ToolResponse::error(call_id, tool_msg.content.clone())
                        } else {
                            ToolResponse::success(call_id, tool_msg.content.clone())
                        });
                        j += 1;
                    }
                    rounds.push(ToolHistoryEntry::new(msg.tool_calls.clone(), responses));
                    i = j;
                }
                AgentRole::Tool => {
                    // Orphan tool message with no opening assistant message
                    log::warn!("Skipping tool message with no preceding tool-call request");
                    i += 1;
                }
            }
        }

        (base, rounds)
    }
}
