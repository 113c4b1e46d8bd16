//! Test support: models and workers that stand in for the Claude CLI.
//!
//! `ScriptedModel` replays canned replies. `ScenarioModel` reads the system
//! prompt and transcript and behaves the way the real prompts ask a model to
//! behave, so full graph runs can be exercised end to end with the real
//! workers and rate tools.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use ratedesk_models::message::{Conversation, Message, Role};
use ratedesk_models::routing::WorkerId;
use rust_decimal::Decimal;

use crate::error::AgentError;
use crate::llm::ChatModel;
use crate::tools::{CdInterestRate, RateTool, SavingInterestRate};
use crate::worker::WorkerAgent;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Replays canned replies in order and records what it was asked.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<Message>>>,
    system_prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
            system_prompts: Mutex::new(Vec::new()),
        }
    }

    /// Messages passed on each call, oldest first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        lock(&self.calls).clone()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        lock(&self.system_prompts).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, AgentError> {
        lock(&self.calls).push(messages.to_vec());
        lock(&self.system_prompts).push(system_prompt.to_string());
        lock(&self.replies)
            .pop_front()
            .ok_or_else(|| AgentError::Cli("Scripted model has no replies left".to_string()))
    }
}

/// First number in `text`, ignoring a trailing `%` or `.`.
pub fn first_rate(text: &str) -> Option<Decimal> {
    text.split_whitespace()
        .map(|word| word.trim_end_matches(|c: char| c == '.' || c == '%' || c == ','))
        .find_map(|word| word.parse::<Decimal>().ok())
}

/// Rate reported by the given agent's handoff message, if any.
fn reported_rate(messages: &[Message], agent: WorkerId) -> Option<Decimal> {
    messages
        .iter()
        .rev()
        .find(|m| m.name.as_deref() == Some(agent.as_str()) && m.role == Role::User)
        .and_then(|m| m.text())
        .and_then(first_rate)
}

/// A model that follows the supervisor and worker prompts deterministically.
///
/// As supervisor it routes to each worker that has not reported yet, in
/// `WorkerId::ALL` order, then FINISH. As a worker it calls its tool once,
/// then answers with the rate. When the other worker has already reported,
/// the answer includes the account recommendation.
#[derive(Debug, Default)]
pub struct ScenarioModel {
    calls: Mutex<usize>,
}

impl ScenarioModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }

    fn route(messages: &[Message]) -> String {
        let next = WorkerId::ALL
            .into_iter()
            .find(|w| reported_rate(messages, *w).is_none())
            .map(|w| w.as_str())
            .unwrap_or("FINISH");
        serde_json::json!({ "next": next }).to_string()
    }

    fn act(worker: WorkerId, tool: &dyn RateTool, messages: &[Message]) -> String {
        let last_tool_result = messages
            .last()
            .filter(|m| m.role == Role::Tool && m.name.as_deref() == Some(tool.name()))
            .and_then(|m| m.text())
            .and_then(|t| t.parse::<Decimal>().ok());

        let Some(rate) = last_tool_result else {
            return serde_json::json!({ "tool_call": { "name": tool.name() } }).to_string();
        };

        let (account, other) = match worker {
            WorkerId::Saving => ("saving", WorkerId::Cd),
            WorkerId::Cd => ("CD", WorkerId::Saving),
        };
        let mut answer = format!("The {account} interest rate is {rate}%.");

        if let Some(other_rate) = reported_rate(messages, other) {
            let (saving, cd) = match worker {
                WorkerId::Saving => (rate, other_rate),
                WorkerId::Cd => (other_rate, rate),
            };
            if saving > cd {
                answer.push_str(&format!(
                    " Since {saving}% beats the CD rate of {cd}%, keep your money in the saving account."
                ));
            } else {
                answer.push_str(&format!(
                    " Since the saving rate of {saving}% does not beat {cd}%, put your money in the CD account."
                ));
            }
        }

        serde_json::json!({ "answer": answer }).to_string()
    }
}

#[async_trait]
impl ChatModel for ScenarioModel {
    fn model_name(&self) -> &str {
        "scenario"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<String, AgentError> {
        *lock(&self.calls) += 1;

        let saving = SavingInterestRate;
        let cd = CdInterestRate;
        if system_prompt.contains(saving.name()) {
            Ok(Self::act(WorkerId::Saving, &saving, messages))
        } else if system_prompt.contains(cd.name()) {
            Ok(Self::act(WorkerId::Cd, &cd, messages))
        } else {
            Ok(Self::route(messages))
        }
    }
}

/// A worker that answers with fixed text and never calls a tool.
pub struct FixedWorker {
    pub id: WorkerId,
    pub answer: String,
}

impl FixedWorker {
    pub fn new(id: WorkerId, answer: &str) -> Self {
        Self {
            id,
            answer: answer.to_string(),
        }
    }
}

#[async_trait]
impl WorkerAgent for FixedWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    async fn respond(&self, conversation: &Conversation) -> Result<Conversation, AgentError> {
        let mut output = conversation.clone();
        output.push(Message::assistant(self.answer.as_str()));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn first_rate_skips_words() {
        assert_eq!(first_rate("The CD interest rate is 0.3%."), Some(dec!(0.3)));
        assert_eq!(first_rate("rate: 0.7, final"), Some(dec!(0.7)));
        assert_eq!(first_rate("no numbers here"), None);
    }

    #[tokio::test]
    async fn scripted_model_runs_out() {
        let model = ScriptedModel::new(&["one"]);
        assert_eq!(model.complete("sys", &[]).await.unwrap(), "one");
        assert_eq!(model.remaining(), 0);
        assert!(model.complete("sys", &[]).await.is_err());
        assert_eq!(model.calls().len(), 2);
    }

    #[tokio::test]
    async fn scenario_supervisor_routes_unreported_workers() {
        let model = ScenarioModel::new();
        let mut messages = vec![Message::user("compare")];
        assert_eq!(
            model.complete("route", &messages).await.unwrap(),
            r#"{"next":"saving-agent"}"#
        );

        messages.push(Message::from_agent("saving-agent", "The saving interest rate is 0.5%."));
        assert_eq!(
            model.complete("route", &messages).await.unwrap(),
            r#"{"next":"cd-agent"}"#
        );

        messages.push(Message::from_agent("cd-agent", "The CD interest rate is 0.2%."));
        assert_eq!(
            model.complete("route", &messages).await.unwrap(),
            r#"{"next":"FINISH"}"#
        );
        assert_eq!(model.call_count(), 3);
    }

    #[test]
    fn scenario_worker_recommends_higher_rate() {
        let call = ratedesk_models::message::ToolCall::new("cd_interest_rate");
        let messages = vec![
            Message::user("compare"),
            Message::from_agent("saving-agent", "The saving interest rate is 0.2%."),
            Message::tool_request(call.clone()),
            Message::tool_result(&call, "0.4"),
        ];

        let reply = ScenarioModel::act(WorkerId::Cd, &CdInterestRate, &messages);
        assert!(reply.contains("The CD interest rate is 0.4%."));
        assert!(reply.contains("put your money in the CD account"));
    }
}
