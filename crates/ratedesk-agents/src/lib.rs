pub mod claude_cli;
pub mod error;
pub mod graph;
pub mod handoff;
pub mod llm;
pub mod parser;
pub mod prompts;
pub mod supervisor;
pub mod tools;
pub mod worker;

pub mod test_support;

pub use claude_cli::ClaudeCliModel;
pub use error::AgentError;
pub use graph::{GraphEvent, SupervisorGraph};
pub use handoff::{handoff, HandoffNode};
pub use llm::ChatModel;
pub use supervisor::SupervisorRouter;
pub use tools::{CdInterestRate, RateTool, SavingInterestRate};
pub use worker::{ReactWorker, WorkerAgent};
