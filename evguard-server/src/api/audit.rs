use axum::{Json, extract::State};
use evguard_sdk::objects::AuditEntryResponse;

use crate::state::AppState;

/// `GET /audit` - recent signal deliveries, oldest first.
pub async fn list_audit(state: State<AppState>) -> Json<Vec<AuditEntryResponse>> {
    let entries = state
        .audit
        .entries()
        .into_iter()
        .map(|entry| AuditEntryResponse {
            topic: entry.topic,
            args: entry.args,
            recorded_at: entry.recorded_at.unix_timestamp(),
        })
        .collect();
    Json(entries)
}
