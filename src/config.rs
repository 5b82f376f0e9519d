//! Machine configuration.

use serde::{Deserialize, Serialize};

fn default_name() -> String {
    "state machine".to_string()
}

/// Settings shared by every execution mode.
///
/// ```rust
/// use hsm_engine::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{ "name": "elevator", "log_transitions": true }"#).unwrap();
/// assert_eq!(config.name, "elevator");
/// assert_eq!(config.worker_thread_name(), "elevator-worker");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Name used in reports, log fields and extension hooks.
    #[serde(default = "default_name")]
    pub name: String,

    /// Thread name of an active machine's worker; `<name>-worker` if unset.
    #[serde(default)]
    pub worker_thread_name: Option<String>,

    /// Install a `LoggingExtension` on construction.
    #[serde(default)]
    pub log_transitions: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            worker_thread_name: None,
            log_transitions: false,
        }
    }
}

impl MachineConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_logging(mut self) -> Self {
        self.log_transitions = true;
        self
    }

    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = Some(name.into());
        self
    }

    pub fn worker_thread_name(&self) -> String {
        self.worker_thread_name
            .clone()
            .unwrap_or_else(|| format!("{}-worker", self.name))
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
        assert_eq!(config.worker_thread_name(), "state machine-worker");
    }

    #[test]
    fn explicit_thread_name_wins() {
        let config = MachineConfig::named("door").with_worker_thread_name("door-loop");
        assert_eq!(config.worker_thread_name(), "door-loop");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(MachineConfig::from_json("{ name: ").is_err());
    }
}
