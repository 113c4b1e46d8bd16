use ratedesk_models::routing::Route;
use serde::Deserialize;

use crate::error::AgentError;

/// Extract the first JSON object from a string that may contain surrounding text.
///
/// Handles common model response formats:
/// - Clean JSON: `{"key": "value"}`
/// - Markdown-wrapped: ```json\n{"key": "value"}\n```
/// - Prefix text: `Here is the analysis:\n{"key": "value"}`
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let trimmed = text.trim();

    // Try parsing the whole thing as JSON first
    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Ok(trimmed.to_string());
    }

    // Try extracting from markdown code block
    if let Some(json_str) = extract_from_markdown_block(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    // Try finding the first { ... } pair using brace matching
    if let Some(json_str) = extract_first_object(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    Err(AgentError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Extract JSON from a markdown code block (```json ... ``` or ``` ... ```)
fn extract_from_markdown_block(text: &str) -> Option<String> {
    // Look for ```json or just ```
    let start_markers = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for marker in &start_markers {
        if let Some(start) = text.find(marker) {
            let json_start = start + marker.len();
            if let Some(end) = text[json_start..].find("```") {
                let extracted = text[json_start..json_start + end].trim();
                return Some(extracted.to_string());
            }
        }
    }

    None
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Structured reply expected from the supervisor.
#[derive(Debug, Deserialize)]
struct RouterReply {
    next: String,
}

/// Parse the supervisor's `{"next": "<label>"}` reply into a closed `Route`.
///
/// Labels outside the known set fail fast with `AgentError::InvalidRoute`.
pub fn parse_routing_decision(raw: &str) -> Result<Route, AgentError> {
    let json_str = extract_json(raw)?;
    let reply: RouterReply = serde_json::from_str(&json_str).map_err(|e| {
        AgentError::Parse(format!("Failed to parse routing decision: {e}\nJSON: {json_str}"))
    })?;
    let label = reply.next.trim();
    label
        .parse::<Route>()
        .map_err(|_| AgentError::InvalidRoute(label.to_string()))
}

/// One turn of a worker's reasoning loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerReply {
    ToolCall { name: String },
    Answer(String),
}

/// Parse a worker model turn.
///
/// Anything that is not a `tool_call` or `answer` object, including text with
/// some other embedded JSON, is taken as a plain-text final answer.
pub fn parse_worker_reply(raw: &str) -> Result<WorkerReply, AgentError> {
    let reply = extract_json(raw)
        .ok()
        .and_then(|json_str| serde_json::from_str::<WorkerReply>(&json_str).ok())
        .unwrap_or_else(|| WorkerReply::Answer(raw.trim().to_string()));

    match reply {
        WorkerReply::Answer(text) if text.trim().is_empty() => {
            Err(AgentError::Parse("Worker returned an empty answer".to_string()))
        }
        WorkerReply::Answer(text) => Ok(WorkerReply::Answer(text.trim().to_string())),
        call => Ok(call),
    }
}
