//! The two node types of the agent graph: one wraps the model call, the
//! other executes the model's tool-call requests.

use futures_util::future::join_all;
use std::sync::Arc;

use crate::agent::prompt::build_system_prompt;
use crate::agent::state::{AgentMessage, AgentState};
use crate::ai::{AiClient, Message};
use crate::tools::{ToolContext, ToolDefinition, ToolRegistry};

/// Reasoning node: renders the system prompt plus the transcript, invokes
/// the model with the tool catalogue bound, and returns the model's message.
pub struct ReasoningNode {
    client: Arc<AiClient>,
    tool_definitions: Vec<ToolDefinition>,
}

impl ReasoningNode {
    pub fn new(client: Arc<AiClient>, registry: &ToolRegistry) -> Self {
        let tool_definitions = registry.get_tool_definitions();
        log::debug!(
            "Reasoning node initialized with {} tools",
            tool_definitions.len()
        );
        ReasoningNode {
            client,
            tool_definitions,
        }
    }

    /// A model-call failure never propagates: it becomes a plain assistant
    /// message so the loop can terminate cleanly.
    pub async fn run(&self, state: &AgentState) -> Vec<AgentMessage> {
        let (base, rounds) = state.to_model_input();
        let mut messages = vec![Message::system(build_system_prompt())];
        messages.extend(base);

        match self
            .client
            .generate_with_tools(messages, rounds, self.tool_definitions.clone())
            .await
        {
            Ok(response) => {
                if response.has_tool_calls() {
                    log::info!("Model requested {} tool call(s)", response.tool_calls.len());
                    vec![AgentMessage::assistant_with_tool_calls(
                        response.content,
                        response.tool_calls,
                    )]
                } else {
                    vec![AgentMessage::assistant(response.content)]
                }
            }
            Err(e) => {
                log::error!("Model call failed: {}", e);
                vec![AgentMessage::assistant(format!(
                    "I encountered an error: {}. Please try again.",
                    e
                ))]
            }
        }
    }
}

/// Tool-execution node: runs every tool call carried by the last message.
/// Calls are independent, so they execute concurrently; results are
/// reassembled in request order. One failing call never stops its siblings.
pub struct ToolExecutionNode {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutionNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        ToolExecutionNode { registry }
    }

    pub async fn run(&self, state: &AgentState, context: &ToolContext) -> Vec<AgentMessage> {
        let calls = match state.last_message() {
            Some(msg) if msg.has_tool_calls() => msg.tool_calls.clone(),
            _ => {
                log::warn!("Tool-execution node reached with no pending tool calls");
                return vec![];
            }
        };

        let executions = calls.iter().map(|call| {
            let registry = self.registry.clone();
            async move {
                let result = registry
                    .execute(&call.name, call.arguments.clone(), context)
                    .await;
                log::info!(
                    "Tool '{}' executed, success: {}",
                    call.name,
                    result.success
                );
                AgentMessage::tool_result(call.id.clone(), result.content, !result.success)
            }
        });

        join_all(executions).await
    }
}
