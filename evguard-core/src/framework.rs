use crate::entities::clients::ClientStore;
use crate::entities::users::UserStore;
use crate::signals::{SignalArgs, SignalBus, SignalError};

/// Executes domain commands against the user and client stores.
///
/// Successful writes announce themselves on the signal bus through
/// [`defer_signal`](ServiceProcessor::defer_signal), so side effects run
/// once the surrounding request has finished.
#[derive(Clone)]
pub struct ServiceProcessor {
    pub users: UserStore,
    pub clients: ClientStore,
    pub signals: SignalBus,
}

impl ServiceProcessor {
    pub fn new(users: UserStore, clients: ClientStore, signals: SignalBus) -> Self {
        Self {
            users,
            clients,
            signals,
        }
    }

    /// Queue a signal for the committed write.
    ///
    /// The write already happened, so a rejected signal is only logged.
    pub fn defer_signal(&self, topic: &str, args: SignalArgs) {
        match self.signals.after_transaction(topic, args) {
            Ok(()) => {}
            Err(SignalError::NoSubscribers { topic }) => {
                tracing::warn!(%topic, "Nobody subscribed to signal, it was not queued");
            }
            Err(e) => {
                tracing::warn!(%topic, error = %e, "Failed to queue signal");
            }
        }
    }
}
