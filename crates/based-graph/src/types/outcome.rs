use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    /// The model produced a terminal answer within the round budget
    Completed,
    /// The wall-clock budget ran out
    TimedOut,
    /// A model call failed
    ModelFailed,
}

/// Result of one exchange; always carries assistant text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub text: String,
    /// Model calls made inside the round loop (classification excluded)
    pub rounds: usize,
    pub tool_calls: usize,
    pub status: ExchangeStatus,
}

impl ExchangeOutcome {
    pub fn is_degraded(&self) -> bool {
        self.status != ExchangeStatus::Completed
    }
}
