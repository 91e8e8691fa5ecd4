//! The orchestrator: a two-node state machine with a conditional edge.
//!
//! After each reasoning step the last message is inspected: tool calls
//! send control to the tool-execution node, whose output loops back to
//! reasoning; no tool calls means the loop is done and the last message is
//! the final answer. A round-trip cap bounds the loop against a model that
//! never stops requesting tools.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::agent::nodes::{ReasoningNode, ToolExecutionNode};
use crate::agent::state::{AgentMessage, AgentState};
use crate::ai::AiClient;
use crate::tools::{ToolContext, ToolRegistry};

/// Default cap on reasoning/tool round trips per invocation
pub const DEFAULT_MAX_ROUND_TRIPS: usize = 10;

const INCOMPLETE_MESSAGE: &str =
    "I could not complete this request within the allowed number of tool steps. \
     Please try again with a simpler request.";

/// Which node produced a streamed delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Reasoning,
    ToolExecution,
}

/// One node's worth of new messages, streamed in execution order
#[derive(Debug, Clone)]
pub struct StateDelta {
    pub node: NodeKind,
    pub messages: Vec<AgentMessage>,
}

pub struct AgentGraph {
    reasoning: ReasoningNode,
    tool_execution: ToolExecutionNode,
    max_round_trips: usize,
}

impl AgentGraph {
    pub fn new(client: Arc<AiClient>, registry: Arc<ToolRegistry>) -> Self {
        AgentGraph {
            reasoning: ReasoningNode::new(client, &registry),
            tool_execution: ToolExecutionNode::new(registry),
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
        }
    }

    pub fn with_max_round_trips(mut self, max_round_trips: usize) -> Self {
        self.max_round_trips = max_round_trips.max(1);
        self
    }

    /// Drive the graph to its terminal state and return the final text.
    pub async fn run(&self, state: &mut AgentState, context: &ToolContext) -> String {
        self.drive(state, context, None).await
    }

    /// Like `run`, but emits each node's new messages through `tx` as they
    /// land. The last delta always carries the terminal assistant message.
    pub async fn run_streaming(
        &self,
        state: &mut AgentState,
        context: &ToolContext,
        tx: &mpsc::Sender<StateDelta>,
    ) -> String {
        self.drive(state, context, Some(tx)).await
    }

    async fn drive(
        &self,
        state: &mut AgentState,
        context: &ToolContext,
        tx: Option<&mpsc::Sender<StateDelta>>,
    ) -> String {
        let mut round_trips = 0;

        loop {
            let new_messages = self.reasoning.run(state).await;
            state.append(new_messages.clone());
            if !Self::emit(tx, NodeKind::Reasoning, new_messages).await {
                return Self::final_text(state);
            }

            let wants_tools = state
                .last_message()
                .map(|m| m.has_tool_calls())
                .unwrap_or(false);

            if !wants_tools {
                return Self::final_text(state);
            }

            if round_trips >= self.max_round_trips {
                log::warn!(
                    "Agent loop exceeded max round trips ({})",
                    self.max_round_trips
                );
                let terminal = vec![AgentMessage::assistant(INCOMPLETE_MESSAGE)];
                state.append(terminal.clone());
                Self::emit(tx, NodeKind::Reasoning, terminal).await;
                return INCOMPLETE_MESSAGE.to_string();
            }
            round_trips += 1;

            let results = self.tool_execution.run(state, context).await;
            state.append(results.clone());
            if !Self::emit(tx, NodeKind::ToolExecution, results).await {
                return Self::final_text(state);
            }
        }
    }

    fn final_text(state: &AgentState) -> String {
        state
            .last_message()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    /// Send a delta to the stream, if any. Returns false when the receiver
    /// is gone and the rest of the invocation should be cancelled.
    async fn emit(
        tx: Option<&mpsc::Sender<StateDelta>>,
        node: NodeKind,
        messages: Vec<AgentMessage>,
    ) -> bool {
        match tx {
            Some(tx) => tx.send(StateDelta { node, messages }).await.is_ok(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiResponse, MockAiClient, ToolCall};
    use crate::db::Database;
    use crate::tools::create_default_registry;
    use serde_json::json;

    fn harness(client: MockAiClient) -> (AgentGraph, AgentState, ToolContext) {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let user = db.get_or_create_user("alice").unwrap();
        let registry = Arc::new(create_default_registry());
        let graph = AgentGraph::new(Arc::new(AiClient::Mock(client)), registry);
        let state = AgentState::new("hello", user.id);
        let context = ToolContext::new(db).with_user(user.id);
        (graph, state, context)
    }

    fn list_call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "list_tasks".to_string(),
            arguments: json!({}),
        }
    }

    #[tokio::test]
    async fn test_plain_answer_terminates_immediately() {
        let mock = MockAiClient::new(vec![Ok(AiResponse::text("Hi there!".to_string()))]);
        let (graph, mut state, context) = harness(mock);

        let result = graph.run(&mut state, &context).await;
        assert_eq!(result, "Hi there!");
        assert_eq!(state.messages().len(), 2); // user + assistant
    }

    #[tokio::test]
    async fn test_one_round_trip_then_answer() {
        let mock = MockAiClient::new(vec![
            Ok(AiResponse::with_tools(String::new(), vec![list_call("c1")])),
            Ok(AiResponse::text("You have no tasks.".to_string())),
        ]);
        let (graph, mut state, context) = harness(mock);

        let result = graph.run(&mut state, &context).await;
        assert_eq!(result, "You have no tasks.");
        // user, assistant+calls, tool result, final assistant
        assert_eq!(state.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_adversarial_model_hits_round_trip_cap() {
        let mock =
            MockAiClient::repeating(AiResponse::with_tools(String::new(), vec![list_call("c")]));
        let db = Arc::new(Database::new(":memory:").unwrap());
        let user = db.get_or_create_user("alice").unwrap();
        let registry = Arc::new(create_default_registry());
        let graph = AgentGraph::new(Arc::new(AiClient::Mock(mock)), registry)
            .with_max_round_trips(3);
        let mut state = AgentState::new("loop forever", user.id);
        let context = ToolContext::new(db).with_user(user.id);

        let result = graph.run(&mut state, &context).await;
        assert!(result.contains("could not complete"));
        // 3 tool rounds (2 messages each) + 4 reasoning messages + user + terminal
        let tool_messages = state
            .messages()
            .iter()
            .filter(|m| m.tool_call_id.is_some())
            .count();
        assert_eq!(tool_messages, 3);
        assert_eq!(state.last_message().unwrap().content, result);
    }

    #[tokio::test]
    async fn test_model_error_becomes_terminal_message() {
        let mock = MockAiClient::new(vec![Err("quota exhausted".to_string())]);
        let (graph, mut state, context) = harness(mock);

        let result = graph.run(&mut state, &context).await;
        assert!(result.contains("I encountered an error"));
        assert!(result.contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_streaming_emits_deltas_in_execution_order() {
        let mock = MockAiClient::new(vec![
            Ok(AiResponse::with_tools(String::new(), vec![list_call("c1")])),
            Ok(AiResponse::text("Done.".to_string())),
        ]);
        let (graph, mut state, context) = harness(mock);

        let (tx, mut rx) = mpsc::channel(16);
        let result = graph.run_streaming(&mut state, &context, &tx).await;
        drop(tx);

        let mut deltas = Vec::new();
        while let Some(delta) = rx.recv().await {
            deltas.push(delta);
        }

        assert_eq!(result, "Done.");
        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0].node, NodeKind::Reasoning);
        assert!(deltas[0].messages[0].has_tool_calls());
        assert_eq!(deltas[1].node, NodeKind::ToolExecution);
        assert_eq!(deltas[2].node, NodeKind::Reasoning);
        assert_eq!(deltas[2].messages[0].content, "Done.");
    }
}
