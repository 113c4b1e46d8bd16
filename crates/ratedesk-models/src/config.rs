use serde::{Deserialize, Serialize};

use crate::routing::WorkerId;

/// Top-level configuration for RATEDESK.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RatedeskConfig {
    pub llm: LlmConfig,
    pub graph: GraphConfig,
    /// Per-worker overrides. Workers without an entry use the defaults.
    pub workers: Vec<WorkerConfig>,
}

impl RatedeskConfig {
    pub fn worker(&self, id: WorkerId) -> Option<&WorkerConfig> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Model for a worker, falling back to `LlmConfig::worker_model`.
    pub fn worker_model(&self, id: WorkerId) -> &str {
        self.worker(id)
            .and_then(|w| w.model.as_deref())
            .unwrap_or(&self.llm.worker_model)
    }
}

/// Configuration for the LLM client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Model used for routing decisions.
    pub supervisor_model: String,
    /// Default model for worker agents.
    pub worker_model: String,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            supervisor_model: "claude-3-5-haiku-latest".to_string(),
            worker_model: "claude-3-5-haiku-latest".to_string(),
            timeout_seconds: 45,
        }
    }
}

/// Limits for a single graph run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum node executions before the run is aborted.
    pub recursion_limit: usize,
    /// Maximum tool-requesting model turns inside one worker invocation.
    pub max_tool_rounds: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 25,
            max_tool_rounds: 5,
        }
    }
}

/// Overrides for a single worker agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    pub id: WorkerId,
    /// Override model for this worker.
    pub model: Option<String>,
    /// Replace the worker's default role instructions.
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: RatedeskConfig = toml::from_str("").unwrap();
        assert_eq!(config, RatedeskConfig::default());
        assert_eq!(config.graph.recursion_limit, 25);
        assert_eq!(config.graph.max_tool_rounds, 5);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[llm]
supervisor_model = "claude-sonnet-4-5-20250929"
timeout_seconds = 20

[graph]
recursion_limit = 10

[[workers]]
id = "cd-agent"
model = "claude-sonnet-4-5-20250929"
instructions = "You quote certificate of deposit rates."
"#;

        let config: RatedeskConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.supervisor_model, "claude-sonnet-4-5-20250929");
        assert_eq!(config.llm.worker_model, "claude-3-5-haiku-latest");
        assert_eq!(config.llm.timeout_seconds, 20);
        assert_eq!(config.graph.recursion_limit, 10);
        assert_eq!(config.graph.max_tool_rounds, 5);
        assert_eq!(config.workers.len(), 1);
        assert_eq!(config.worker_model(WorkerId::Cd), "claude-sonnet-4-5-20250929");
        assert_eq!(config.worker_model(WorkerId::Saving), "claude-3-5-haiku-latest");
    }

    #[test]
    fn unknown_worker_id_is_rejected() {
        let toml_str = r#"
[[workers]]
id = "loan-agent"
"#;
        assert!(toml::from_str::<RatedeskConfig>(toml_str).is_err());
    }

    #[test]
    fn roundtrip_config() {
        let config = RatedeskConfig {
            workers: vec![WorkerConfig {
                id: WorkerId::Saving,
                model: None,
                instructions: Some("Quote savings rates.".to_string()),
            }],
            ..RatedeskConfig::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: RatedeskConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
