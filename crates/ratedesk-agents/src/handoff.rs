use std::sync::Arc;

use ratedesk_models::message::{Conversation, Message};
use ratedesk_models::routing::{Command, Goto, NodeId, WorkerId};
use tracing::info;

use crate::error::AgentError;
use crate::worker::WorkerAgent;

/// Wrap a worker's output into the single tagged message sent back to the
/// supervisor.
///
/// `visible_len` is the length of the conversation the worker was given; the
/// worker must have appended at least one message with content after it.
pub fn handoff(
    agent: WorkerId,
    output: &Conversation,
    visible_len: usize,
) -> Result<Command, AgentError> {
    let answer = output
        .since(visible_len)
        .last()
        .and_then(Message::text)
        .ok_or_else(|| AgentError::EmptyWorkerOutput(agent.to_string()))?;

    Ok(Command::goto(Goto::Node(NodeId::Supervisor))
        .with_update(vec![Message::from_agent(agent.as_str(), answer)]))
}

/// Result of running a worker node: the handoff command plus every message
/// the worker produced internally.
#[derive(Debug, Clone)]
pub struct WorkerStep {
    pub command: Command,
    pub inner: Vec<Message>,
}

/// Graph node pairing a worker with its handoff.
pub struct HandoffNode {
    worker: Arc<dyn WorkerAgent>,
}

impl HandoffNode {
    pub fn new(worker: Arc<dyn WorkerAgent>) -> Self {
        Self { worker }
    }

    pub fn id(&self) -> WorkerId {
        self.worker.id()
    }

    pub async fn run(&self, state: &Conversation) -> Result<WorkerStep, AgentError> {
        let agent = self.worker.id();
        let output = self.worker.respond(state).await?;
        let command = handoff(agent, &output, state.len())?;
        info!(agent = %agent, inner_messages = output.len() - state.len(), "Handoff to supervisor");

        Ok(WorkerStep {
            command,
            inner: output.since(state.len()).to_vec(),
        })
    }
}
