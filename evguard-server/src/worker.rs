//! Background flush worker.
//!
//! When `signals.background_flush` is enabled, deferred signals are also
//! delivered as soon as they are queued, not only at the end of the HTTP
//! request that produced them.
//!
//! The flush runs inline on the runtime like the request middleware's,
//! which relies on subscriber callbacks being short and non-blocking.

use evguard_core::signals::SignalBus;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Drains the signal queue whenever the bus reports a new event.
pub struct EventWorker {
    signals: SignalBus,
}

impl EventWorker {
    pub fn new(signals: SignalBus) -> Self {
        Self { signals }
    }

    /// Spawn the worker on the runtime.
    pub fn spawn(self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown_rx))
    }

    /// Run until shutdown is signaled.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("EventWorker started listening for signals");

        loop {
            tokio::select! {
                biased;

                // Shutdown has highest priority.
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("EventWorker received shutdown signal");
                        break;
                    }
                }

                _ = self.signals.notified() => {
                    self.flush();
                }
            }
        }

        info!("EventWorker shutdown complete");
    }

    fn flush(&self) {
        match self.signals.process_queue() {
            Ok(summary) if summary.processed > 0 => {
                debug!(
                    processed = summary.processed,
                    failed = summary.failed,
                    "EventWorker flushed signals"
                );
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "EventWorker failed to flush signals"),
        }
    }
}
