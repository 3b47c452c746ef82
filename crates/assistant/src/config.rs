use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub num_predict: u32,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2:3b".into(),
            temperature: 0.7,
            num_predict: 200,
            timeout_ms: 30_000,
            max_retries: 2,
            backoff_ms: 250,
        }
    }
}

impl AssistantConfig {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }

    /// Delay before retry number `attempt` (0-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim().trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let cfg = AssistantConfig { backoff_ms: 100, ..Default::default() };
        assert_eq!(cfg.backoff(0), Duration::from_millis(100));
        assert_eq!(cfg.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn endpoint_joins_cleanly() {
        let cfg = AssistantConfig { base_url: "http://host:1/".into(), ..Default::default() };
        assert_eq!(cfg.endpoint("/api/generate"), "http://host:1/api/generate");
        assert_eq!(AssistantConfig::default().endpoint("api/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AssistantConfig = serde_json::from_str(r#"{"model":"mistral"}"#).unwrap();
        assert_eq!(cfg.model, "mistral");
        assert_eq!(cfg.num_predict, 200);
    }
}
