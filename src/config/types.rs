use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HyperMailConfig {
    pub backend: Option<BackendConfig>,
    pub simulator: Option<SimulatorConfig>,
    pub sender: Option<SenderConfig>,
}

impl HyperMailConfig {
    pub fn base_url(&self) -> String {
        self.backend
            .as_ref()
            .and_then(|b| b.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn timeout_secs(&self) -> u64 {
        self.backend
            .as_ref()
            .and_then(|b| b.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SimulatorConfig {
    pub tick_count: Option<u32>,
    pub jitter: Option<f64>,
    pub complexity: Option<FactorRange>,
    pub inter_stage_delay_ms: Option<DelayRange>,
    pub fast_forward_interval_ms: Option<u64>,
    pub seed: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
    pub stages: Option<Vec<StageConfig>>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct FactorRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

/// What settlement does to the animation when the real request failed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fast-forward every stage to completion and flag the run as failed.
    #[default]
    Complete,
    /// Stop where we are and mark the running stage as errored.
    Freeze,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Freeze => "freeze",
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StageConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub estimated_duration_secs: f64,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SenderConfig {
    pub cc: Option<String>,
    pub subject: Option<String>,
}
