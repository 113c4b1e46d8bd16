//! RATEDESK - a supervisor that routes banking questions to rate agents.
//!
//! A supervisor model picks the next worker (`saving-agent` or `cd-agent`),
//! each worker quotes its rate through a mocked tool, and control returns to
//! the supervisor until it answers FINISH.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use ratedesk::models::{Conversation, RatedeskConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = RatedeskConfig::default();
//! let graph = ratedesk::build_graph(&config);
//! let conversation = graph
//!     .invoke(Conversation::from_user(ratedesk::DEFAULT_REQUEST))
//!     .await?;
//! println!("{} messages", conversation.len());
//! # Ok(())
//! # }
//! ```

pub use ratedesk_agents as agents;
pub use ratedesk_models as models;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ratedesk_agents::graph::GraphEvent;
use ratedesk_agents::prompts::default_worker_instructions;
use ratedesk_agents::worker::default_tool;
use ratedesk_agents::{ChatModel, ClaudeCliModel, ReactWorker, SupervisorGraph, SupervisorRouter};
use ratedesk_models::config::RatedeskConfig;
use ratedesk_models::message::Role;
use ratedesk_models::routing::{NodeId, WorkerId};

/// The scripted question the binary asks when no `--message` is given.
pub const DEFAULT_REQUEST: &str = "Advise me to keep my money in saving account if the saving \
     interest rate higher than the CD interest rate. Otherwise, advise me to put my money in CD \
     account.";

/// Read a TOML configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<RatedeskConfig, anyhow::Error> {
    let path = path.as_ref();
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&config_str).with_context(|| "Failed to parse config")
}

/// Point the supervisor and every worker at one model, dropping per-worker overrides.
pub fn apply_model_override(config: &mut RatedeskConfig, model: String) {
    config.llm.supervisor_model = model.clone();
    config.llm.worker_model = model;
    for worker in &mut config.workers {
        worker.model = None;
    }
}

/// Build the supervisor graph backed by the Claude CLI.
pub fn build_graph(config: &RatedeskConfig) -> SupervisorGraph {
    let timeout = Duration::from_secs(config.llm.timeout_seconds);
    let supervisor: Arc<dyn ChatModel> = Arc::new(ClaudeCliModel::new(
        config.llm.supervisor_model.clone(),
        timeout,
    ));

    build_graph_with(config, supervisor, |id| {
        Arc::new(ClaudeCliModel::new(config.worker_model(id), timeout)) as Arc<dyn ChatModel>
    })
}

/// Build the supervisor graph with injected models.
pub fn build_graph_with(
    config: &RatedeskConfig,
    supervisor_model: Arc<dyn ChatModel>,
    worker_model: impl Fn(WorkerId) -> Arc<dyn ChatModel>,
) -> SupervisorGraph {
    let mut graph = SupervisorGraph::new(
        SupervisorRouter::new(supervisor_model),
        config.graph.recursion_limit,
    );

    for id in WorkerId::ALL {
        let instructions = config
            .worker(id)
            .and_then(|w| w.instructions.as_deref())
            .unwrap_or_else(|| default_worker_instructions(id));
        graph = graph.add_worker(Arc::new(ReactWorker::new(
            id,
            worker_model(id),
            default_tool(id),
            instructions,
            config.graph.max_tool_rounds,
        )));
    }

    graph
}

/// Console lines for one streamed event: worker answers and tool calls.
pub fn console_lines(event: &GraphEvent) -> Vec<String> {
    let NodeId::Worker(agent) = event.node else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for message in event.inner.iter().filter(|m| m.role == Role::Assistant) {
        if let Some(text) = message.text() {
            lines.push(format!("Agent {agent}: {text}"));
        } else {
            for call in &message.tool_calls {
                lines.push(format!("Tool: {}", call.name));
            }
        }
    }
    lines
}
