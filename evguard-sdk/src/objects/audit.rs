//! Audit API response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One delivered signal, as returned by `GET /audit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntryResponse {
    /// The topic the signal was delivered on.
    pub topic: String,
    pub args: Vec<Value>,
    /// Unix timestamp (seconds).
    pub recorded_at: i64,
}
