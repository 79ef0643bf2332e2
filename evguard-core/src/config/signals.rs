//! Signal bus configuration.

/// Default number of entries kept by the audit trail.
pub const DEFAULT_AUDIT_CAPACITY: usize = 128;

/// Settings for the signal bus and the subscribers registered at startup.
#[derive(Debug, Clone)]
pub struct SignalsConfig {
    /// Maximum number of pending deferred events.
    ///
    /// `None` keeps the queue unbounded. When set, `after_transaction`
    /// rejects new events once the queue holds this many.
    pub max_pending: Option<usize>,
    /// Also drain the queue from a background task whenever an event is
    /// deferred, instead of only at the end of each HTTP request.
    pub background_flush: bool,
    /// Number of recent deliveries retained by the audit trail.
    pub audit_capacity: usize,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            max_pending: None,
            background_flush: false,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}
