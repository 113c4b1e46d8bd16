use std::sync::Arc;

use ratedesk_models::message::{Conversation, Message};
use ratedesk_models::routing::{Command, Route, WorkerId};
use tracing::info;

use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::parser::parse_routing_decision;
use crate::prompts::supervisor_system_prompt;

/// Chooses the next actor for the conversation.
pub struct SupervisorRouter {
    model: Arc<dyn ChatModel>,
    system_prompt: String,
}

impl SupervisorRouter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self::with_workers(model, &WorkerId::ALL)
    }

    pub fn with_workers(model: Arc<dyn ChatModel>, workers: &[WorkerId]) -> Self {
        Self {
            model,
            system_prompt: supervisor_system_prompt(workers),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Ask the model for a routing decision over the full conversation.
    pub async fn decide(&self, state: &Conversation) -> Result<Route, AgentError> {
        info!(message = ?Message::system(self.system_prompt.as_str()), "Message");
        for message in state {
            info!(?message, "Message");
        }

        let raw = self
            .model
            .complete(&self.system_prompt, state.messages())
            .await?;
        let route = parse_routing_decision(&raw)?;

        info!(model = self.model.model_name(), next = %route, "Supervisor routed");
        Ok(route)
    }

    pub async fn run(&self, state: &Conversation) -> Result<Command, AgentError> {
        let route = self.decide(state).await?;
        Ok(Command::goto(route.goto()))
    }
}
