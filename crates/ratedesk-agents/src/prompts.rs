use ratedesk_models::routing::{Route, WorkerId};

use crate::tools::RateTool;

/// Routing instruction prepended to every supervisor call.
pub fn supervisor_system_prompt(workers: &[WorkerId]) -> String {
    let names: Vec<&str> = workers.iter().map(|w| w.as_str()).collect();
    let mut options = names.clone();
    options.push(Route::FINISH_LABEL);

    let example = serde_json::json!({ "next": "<one of the options>" });
    format!(
        "You are my bank agent tasked with managing a conversation between the \
         following agents: {names:?}. Given my request, respond with the agent to \
         act next. Each agent will perform a task and respond with their results \
         and status. When finished, respond with {finish}.\n\n\
         The conversation is given to you as a JSON transcript. Messages whose \
         `name` is an agent name are that agent's results.\n\n\
         ## RESPONSE FORMAT\n\n\
         Respond ONLY with a JSON object, no other text:\n{example}\n\n\
         `next` must be exactly one of: {options:?}",
        finish = Route::FINISH_LABEL,
        example = serde_json::to_string_pretty(&example).unwrap_or_default(),
    )
}

/// Default role instructions for each worker.
pub fn default_worker_instructions(worker: WorkerId) -> &'static str {
    match worker {
        WorkerId::Saving => {
            "You are the saving account agent. You are tasked with providing the \
             saving interest rate."
        }
        WorkerId::Cd => {
            "You are the CD account agent. You are tasked with providing the CD \
             interest rate."
        }
    }
}

/// System prompt for a worker: role instructions plus the tool-calling protocol.
pub fn worker_system_prompt(instructions: &str, tool: &dyn RateTool) -> String {
    let call_example = serde_json::json!({ "tool_call": { "name": tool.name() } });
    let answer_example = serde_json::json!({ "answer": "<your final answer>" });
    format!(
        "{instructions}\n\n\
         ## TOOLS\n\n\
         - `{name}`: {description} Takes no arguments.\n\n\
         ## PROTOCOL\n\n\
         The conversation is given to you as a JSON transcript. Messages with \
         role `tool` are results of your earlier tool calls.\n\
         Respond ONLY with a JSON object, either a tool call:\n{call}\n\
         or, once you have what you need, your final answer:\n{answer}",
        name = tool.name(),
        description = tool.description(),
        call = serde_json::to_string(&call_example).unwrap_or_default(),
        answer = serde_json::to_string(&answer_example).unwrap_or_default(),
    )
}
