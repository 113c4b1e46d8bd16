use async_trait::async_trait;
use ratedesk_models::message::Message;

use crate::error::AgentError;

/// A chat-completion capability. Injected into every node so tests can swap
/// in scripted models.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Complete one turn given a system prompt and the visible messages.
    /// Returns the raw model text.
    async fn complete(&self, system_prompt: &str, messages: &[Message])
        -> Result<String, AgentError>;
}

/// Render messages as the JSON transcript sent to text-only models.
pub fn render_transcript(messages: &[Message]) -> Result<String, AgentError> {
    let transcript = serde_json::json!({ "messages": messages });
    Ok(serde_json::to_string_pretty(&transcript)?)
}
