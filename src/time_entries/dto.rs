use serde::{Deserialize, Serialize};

/// Optional overrides applied when stopping a timer.
#[derive(Debug, Default, Deserialize)]
pub struct StopTimerRequest {
    pub notes: Option<String>,
    pub pause_reason: Option<String>,
    pub is_goodwill: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub approved: u64,
}
