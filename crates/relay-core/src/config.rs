use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::state::UiTheme;
use crate::state::DEFAULT_LOG_CAPACITY;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    pub approval: ApprovalConfig,
    pub logs: LogsConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Unset keeps an unacknowledged request in flight indefinitely.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogsConfig {
    pub capacity: usize,
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_LOG_CAPACITY,
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub collapse_finished_phases: bool,
    pub theme: UiTheme,
}
