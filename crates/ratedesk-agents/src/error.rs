use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("LLM call timed out after {0} seconds")]
    Timeout(u64),

    #[error("Supervisor chose an unknown route: {0:?}")]
    InvalidRoute(String),

    #[error("Worker {0} produced no output to hand off")]
    EmptyWorkerOutput(String),

    #[error("Worker {agent} exceeded {limit} tool rounds without answering")]
    MaxToolRounds { agent: String, limit: usize },

    #[error("Graph exceeded recursion limit of {0} steps without finishing")]
    RecursionLimit(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
