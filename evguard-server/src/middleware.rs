//! Request middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use evguard_core::signals::SignalBus;

/// Deliver the signals deferred while handling a request once it completes.
///
/// The flush runs from a drop guard, so it also happens when the handler
/// future is dropped early (client disconnect) or unwinds. It runs inline
/// on the runtime thread; see [`evguard_core::signals::Callback`] for what
/// that asks of subscribers.
pub async fn flush_signals(
    State(signals): State<SignalBus>,
    request: Request,
    next: Next,
) -> Response {
    let _flush = FlushOnDrop {
        signals,
        path: request.uri().path().to_owned(),
    };
    next.run(request).await
}

struct FlushOnDrop {
    signals: SignalBus,
    path: String,
}

impl Drop for FlushOnDrop {
    fn drop(&mut self) {
        match self.signals.process_queue() {
            Ok(summary) if summary.processed > 0 => {
                tracing::debug!(
                    path = %self.path,
                    processed = summary.processed,
                    failed = summary.failed,
                    "Flushed deferred signals"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(path = %self.path, error = %e, "Failed to flush deferred signals");
            }
        }
    }
}
