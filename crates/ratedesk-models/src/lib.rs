pub mod config;
pub mod message;
pub mod routing;

pub use config::{GraphConfig, LlmConfig, RatedeskConfig, WorkerConfig};
pub use message::{Conversation, Message, Role, ToolCall};
pub use routing::{Command, Goto, NodeId, Route, UnknownLabel, WorkerId};
