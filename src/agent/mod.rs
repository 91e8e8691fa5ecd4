//! The conversational task agent: a two-node graph (reasoning +
//! tool execution) driven to completion per user message, with the acting
//! user resolved once per invocation and threaded through explicitly.

pub mod graph;
pub mod nodes;
pub mod prompt;
pub mod state;

pub use graph::{AgentGraph, NodeKind, StateDelta, DEFAULT_MAX_ROUND_TRIPS};
pub use state::{AgentMessage, AgentRole, AgentState};

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ai::AiClient;
use crate::db::Database;
use crate::tools::{ToolContext, ToolRegistry};

/// Public entry point for the agent.
///
/// Every invocation gets a fresh `AgentState` and `ToolContext`; nothing is
/// shared between invocations except the database, the model client, and
/// the tool registry, all of which are internally synchronized. Ordinary
/// model and tool failures come back as displayable text, never as errors.
#[derive(Clone)]
pub struct TaskAgent {
    db: Arc<Database>,
    client: Arc<AiClient>,
    registry: Arc<ToolRegistry>,
    max_round_trips: usize,
}

impl TaskAgent {
    pub fn new(db: Arc<Database>, client: Arc<AiClient>, registry: Arc<ToolRegistry>) -> Self {
        TaskAgent {
            db,
            client,
            registry,
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
        }
    }

    pub fn with_max_round_trips(mut self, max_round_trips: usize) -> Self {
        self.max_round_trips = max_round_trips.max(1);
        self
    }

    fn graph(&self) -> AgentGraph {
        AgentGraph::new(self.client.clone(), self.registry.clone())
            .with_max_round_trips(self.max_round_trips)
    }

    /// Resolve the external user id and build the per-invocation state and
    /// context. The Err side is already a user-displayable string.
    fn prepare(
        &self,
        message: &str,
        external_user_id: &str,
    ) -> Result<(AgentState, ToolContext), String> {
        let user = self.db.get_or_create_user(external_user_id).map_err(|e| {
            log::error!("Failed to resolve user '{}': {}", external_user_id, e);
            format!("I couldn't look up your account: {}. Please try again.", e)
        })?;

        let state = AgentState::new(message, user.id);
        let context = ToolContext::new(self.db.clone()).with_user(user.id);
        Ok((state, context))
    }

    /// Process one user message and return the agent's final answer.
    pub async fn ainvoke(&self, message: &str, external_user_id: &str) -> String {
        let (mut state, context) = match self.prepare(message, external_user_id) {
            Ok(prepared) => prepared,
            Err(error_text) => return error_text,
        };

        self.graph().run(&mut state, &context).await
    }

    /// Blocking variant of `ainvoke` for synchronous callers. When called
    /// from inside a tokio runtime the work hops to a fresh thread, since a
    /// runtime thread cannot block on a nested runtime.
    pub fn invoke(&self, message: &str, external_user_id: &str) -> String {
        let agent = self.clone();
        let message = message.to_string();
        let external_user_id = external_user_id.to_string();

        let run = move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::error!("Failed to build runtime for invoke: {}", e);
                    return format!("I encountered an internal error: {}. Please try again.", e);
                }
            };
            runtime.block_on(agent.ainvoke(&message, &external_user_id))
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            match std::thread::spawn(run).join() {
                Ok(answer) => answer,
                Err(_) => {
                    log::error!("invoke worker thread panicked");
                    "I encountered an internal error. Please try again.".to_string()
                }
            }
        } else {
            run()
        }
    }

    /// Streaming variant: yields each node's new messages as they land.
    /// The stream ends after the delta carrying the terminal assistant
    /// message; dropping the receiver cancels the invocation at its next
    /// suspend point (the per-invocation context is dropped with it, so
    /// nothing leaks into later invocations).
    pub fn astream(&self, message: &str, external_user_id: &str) -> mpsc::Receiver<StateDelta> {
        let (tx, rx) = mpsc::channel(16);

        let (mut state, context) = match self.prepare(message, external_user_id) {
            Ok(prepared) => prepared,
            Err(error_text) => {
                let tx_err = tx.clone();
                tokio::spawn(async move {
                    let _ = tx_err
                        .send(StateDelta {
                            node: NodeKind::Reasoning,
                            messages: vec![AgentMessage::assistant(error_text)],
                        })
                        .await;
                });
                return rx;
            }
        };

        let agent = self.clone();
        tokio::spawn(async move {
            agent.graph().run_streaming(&mut state, &context, &tx).await;
        });

        rx
    }
}
