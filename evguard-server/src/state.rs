//! Application state shared across all request handlers.

use evguard_core::config::RuntimeConfig;
use evguard_core::entities::clients::ClientStore;
use evguard_core::entities::users::UserStore;
use evguard_core::framework::ServiceProcessor;
use evguard_core::handlers::{AuditTrail, AuthUserSignalHandlers, RevocationList};
use evguard_core::signals::{SignalBus, topics};

/// Topics recorded by the audit trail.
const AUDITED_TOPICS: &[&str] = &[
    topics::USER_CREATED,
    topics::USER_UPDATED,
    topics::CLIENT_CREATED,
    topics::CLIENT_UPDATED,
];

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Executes user and client commands and queues their signals.
    pub processor: ServiceProcessor,
    /// The process-wide signal bus.
    pub signals: SignalBus,
    /// Sessions awaiting re-validation, fed by the `user:updated` handlers
    /// and cleared by the `ResponsibleUser` extractor.
    pub revocations: RevocationList,
    /// Recent signal deliveries.
    pub audit: AuditTrail,
}

impl AppState {
    /// Build the state and register every startup subscriber on the bus.
    pub fn new(config: &RuntimeConfig) -> Self {
        let signals = SignalBus::new(&config.signals, tracing::info_span!("signals"));

        let revocations = RevocationList::new();
        AuthUserSignalHandlers::register(&signals, revocations.clone());

        let audit = AuditTrail::new(config.signals.audit_capacity);
        audit.register(&signals, AUDITED_TOPICS);

        tracing::info!(
            subscriptions = signals.subscription_count(),
            "Signal handlers registered"
        );

        Self {
            processor: ServiceProcessor::new(UserStore::new(), ClientStore::new(), signals.clone()),
            signals,
            revocations,
            audit,
        }
    }
}
