pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{
    MissingUserError, PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult,
};

use std::sync::Arc;

/// Create a registry populated with all built-in task tools
pub fn create_default_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(builtin::AddTaskTool::new()));
    registry.register(Arc::new(builtin::RemoveTaskTool::new()));
    registry.register(Arc::new(builtin::CompleteTaskTool::new()));
    registry.register(Arc::new(builtin::UpdateTaskTool::new()));
    registry.register(Arc::new(builtin::SearchTasksTool::new()));
    registry.register(Arc::new(builtin::ListTasksTool::new()));
    registry.register(Arc::new(builtin::TaskStatisticsTool::new()));
    registry.register(Arc::new(builtin::GroupTasksByPriorityTool::new()));
    registry.register(Arc::new(builtin::GroupTasksByStatusTool::new()));
    registry
}
