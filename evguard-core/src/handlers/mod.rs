//! Side-effect handlers registered on the signal bus at startup.
//!
//! - `AuthUserSignalHandlers`: reacts to `user:updated` by logging the change
//!   and flagging the user's sessions for re-validation
//! - `AuditTrail`: keeps the most recent deliveries for inspection

pub mod audit;
pub mod auth_user;

pub use audit::{AuditEntry, AuditTrail};
pub use auth_user::{AuthUserSignalHandlers, RevocationList};

use anyhow::Context;
use serde_json::Value;
use uuid::Uuid;

/// Read the user id carried as the first signal argument.
pub(crate) fn user_id_arg(args: &[Value]) -> anyhow::Result<Uuid> {
    let raw = args
        .first()
        .and_then(Value::as_str)
        .context("expected a user id as the first signal argument")?;
    raw.parse()
        .with_context(|| format!("invalid user id in signal: {raw}"))
}
