pub mod chat_session;
pub mod task;
pub mod user;

pub use chat_session::{ChatMessage, ChatRole, ChatSession};
pub use task::{
    CreateTaskRequest, Task, TaskPriority, TaskStatistics, TaskStatus, UpdateTaskRequest,
};
pub use user::User;
