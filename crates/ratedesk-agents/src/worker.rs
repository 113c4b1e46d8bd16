use std::sync::Arc;

use async_trait::async_trait;
use ratedesk_models::message::{Conversation, Message, ToolCall};
use ratedesk_models::routing::WorkerId;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::parser::{parse_worker_reply, WorkerReply};
use crate::prompts::{default_worker_instructions, worker_system_prompt};
use crate::tools::{CdInterestRate, RateTool, SavingInterestRate};

/// A worker agent: takes the conversation, returns it extended with at
/// least one message holding the final answer. Mockable for testing.
#[async_trait]
pub trait WorkerAgent: Send + Sync {
    fn id(&self) -> WorkerId;

    async fn respond(&self, conversation: &Conversation) -> Result<Conversation, AgentError>;
}

/// The rate tool bound to each worker.
pub fn default_tool(worker: WorkerId) -> Arc<dyn RateTool> {
    match worker {
        WorkerId::Saving => Arc::new(SavingInterestRate),
        WorkerId::Cd => Arc::new(CdInterestRate),
    }
}

/// A worker that alternates model turns and tool calls until the model answers.
pub struct ReactWorker {
    id: WorkerId,
    model: Arc<dyn ChatModel>,
    tool: Arc<dyn RateTool>,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl ReactWorker {
    pub fn new(
        id: WorkerId,
        model: Arc<dyn ChatModel>,
        tool: Arc<dyn RateTool>,
        instructions: &str,
        max_tool_rounds: usize,
    ) -> Self {
        let system_prompt = worker_system_prompt(instructions, tool.as_ref());
        Self {
            id,
            model,
            tool,
            system_prompt,
            max_tool_rounds,
        }
    }

    /// A worker with its default tool and instructions.
    pub fn with_defaults(id: WorkerId, model: Arc<dyn ChatModel>, max_tool_rounds: usize) -> Self {
        Self::new(
            id,
            model,
            default_tool(id),
            default_worker_instructions(id),
            max_tool_rounds,
        )
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn run_tool(&self, call: &ToolCall) -> Message {
        if call.name == self.tool.name() {
            let rate = self.tool.call();
            Message::tool_result(call, rate.to_string())
        } else {
            warn!(agent = %self.id, tool = %call.name, "Model requested an unknown tool");
            Message::tool_result(
                call,
                format!(
                    "Error: {} is not a valid tool, try {} instead.",
                    call.name,
                    self.tool.name()
                ),
            )
        }
    }
}

#[async_trait]
impl WorkerAgent for ReactWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    async fn respond(&self, conversation: &Conversation) -> Result<Conversation, AgentError> {
        let mut state = conversation.clone();
        let mut tool_rounds = 0;

        loop {
            let raw = self.model.complete(&self.system_prompt, state.messages()).await?;

            match parse_worker_reply(&raw)? {
                WorkerReply::Answer(text) => {
                    info!(agent = %self.id, tool_rounds, "Worker answered");
                    state.push(Message::assistant(text));
                    return Ok(state);
                }
                WorkerReply::ToolCall { name } => {
                    tool_rounds += 1;
                    if tool_rounds > self.max_tool_rounds {
                        return Err(AgentError::MaxToolRounds {
                            agent: self.id.to_string(),
                            limit: self.max_tool_rounds,
                        });
                    }

                    debug!(agent = %self.id, tool = %name, round = tool_rounds, "Tool call");
                    let call = ToolCall::new(name);
                    let result = self.run_tool(&call);
                    state.push(Message::tool_request(call));
                    state.push(result);
                }
            }
        }
    }
}
