//! Auth-side reactions to user changes.

use super::user_id_arg;
use crate::signals::{SignalBus, topics};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Users whose issued sessions must be re-validated before further use.
#[derive(Debug, Clone, Default)]
pub struct RevocationList {
    inner: Arc<RwLock<HashSet<Uuid>>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, user_id: Uuid) {
        self.inner.write().insert(user_id);
    }

    pub fn is_marked(&self, user_id: Uuid) -> bool {
        self.inner.read().contains(&user_id)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self, user_id: Uuid) -> bool {
        self.inner.write().remove(&user_id)
    }
}

/// Registers the auth module's `user:updated` subscribers.
pub struct AuthUserSignalHandlers;

impl AuthUserSignalHandlers {
    pub fn register(bus: &SignalBus, revocations: RevocationList) {
        bus.subscribe_fn(topics::USER_UPDATED, |args| {
            let user_id = user_id_arg(args)?;
            tracing::info!(%user_id, "User profile updated");
            Ok(())
        });

        bus.subscribe_fn(topics::USER_UPDATED, move |args| {
            let user_id = user_id_arg(args)?;
            revocations.mark(user_id);
            tracing::debug!(%user_id, "Sessions flagged for re-validation");
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_update_marks_sessions() {
        let bus = SignalBus::default();
        let revocations = RevocationList::new();
        AuthUserSignalHandlers::register(&bus, revocations.clone());
        assert_eq!(bus.subscription_count(), 2);

        let user_id = Uuid::now_v7();
        bus.after_transaction(topics::USER_UPDATED, vec![json!(user_id)])
            .unwrap();
        assert!(!revocations.is_marked(user_id));

        bus.process_queue().unwrap();
        assert!(revocations.is_marked(user_id));
        assert!(revocations.take(user_id));
        assert!(!revocations.take(user_id));
        assert!(!revocations.is_marked(user_id));
    }

    #[test]
    fn test_malformed_argument_fails_the_chain() {
        let bus = SignalBus::default();
        let revocations = RevocationList::new();
        AuthUserSignalHandlers::register(&bus, revocations.clone());

        let err = bus
            .emit(topics::USER_UPDATED, &[json!("not-a-uuid")])
            .unwrap_err();
        assert!(err.to_string().contains("invalid user id"));
        assert!(bus.emit(topics::USER_UPDATED, &[]).is_err());
        assert!(revocations.inner.read().is_empty());
    }
}
