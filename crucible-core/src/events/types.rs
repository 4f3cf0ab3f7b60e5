//! Event payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedEvent {
    pub record_count: usize,
    pub prediction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompleteEvent {
    pub verdict_count: usize,
    pub discoveries: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRejectedEvent {
    pub prediction_id: String,
    pub index: usize,
    pub error_code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingFailedEvent {
    pub prediction_id: String,
    pub error_code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnblindedEvent {
    pub sequence: u64,
    pub timestamp: String,
    pub hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictIssuedEvent {
    pub prediction_id: String,
    pub decision: String,
    pub reason: Option<String>,
}
