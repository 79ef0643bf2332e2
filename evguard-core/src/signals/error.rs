use thiserror::Error;

/// Errors returned by [`SignalBus`](super::SignalBus) operations.
#[derive(Debug, Error)]
pub enum SignalError {
    /// `after_transaction` was called for a topic no pattern matches.
    #[error("no subscriptions for topic: {topic}")]
    NoSubscribers { topic: String },

    /// The pending queue reached its configured capacity.
    #[error("signal queue is full ({capacity} pending), dropping topic: {topic}")]
    QueueFull { topic: String, capacity: usize },

    /// A callback tried to use the bus that is currently running it.
    #[error("signal bus called from inside one of its own callbacks")]
    Reentrant,

    /// A subscriber callback failed. The error is passed through untouched.
    #[error(transparent)]
    Callback(anyhow::Error),
}
