//! The signal bus.
//!
//! State is one insertion-ordered map from pattern to callbacks plus one
//! FIFO queue of deferred events, both behind the same mutex. Every public
//! operation holds the mutex for its whole duration, including the time
//! spent inside subscriber callbacks, so delivery is fully serialized.

use super::error::SignalError;
use super::pattern::TopicPattern;
use crate::config::SignalsConfig;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::{Span, debug, error, trace};

/// Positional arguments carried by a signal.
pub type SignalArgs = Vec<Value>;

/// A subscriber callback.
///
/// Callbacks run under the bus lock, usually on an async runtime thread
/// (the HTTP middleware flushes from there). They must be short and must
/// not block; hand slow work to a spawned task.
pub type Callback = Arc<dyn Fn(&[Value]) -> anyhow::Result<()> + Send + Sync>;

/// An event waiting in the deferred queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub topic: String,
    pub args: SignalArgs,
}

/// Outcome of one [`SignalBus::process_queue`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Events removed from the queue.
    pub processed: usize,
    /// Events whose callback chain stopped on an error.
    pub failed: usize,
}

struct Subscription {
    pattern: TopicPattern,
    callbacks: Vec<Callback>,
}

#[derive(Default)]
struct BusState {
    subscriptions: IndexMap<String, Subscription>,
    queue: VecDeque<PendingEvent>,
}

impl BusState {
    fn has_match(&self, topic: &str) -> bool {
        self.subscriptions
            .values()
            .any(|sub| sub.pattern.matches(topic))
    }

    /// Run every callback whose pattern matches `topic`.
    ///
    /// Patterns are visited in first-subscription order, callbacks in
    /// subscription order. Stops at the first failing callback.
    fn dispatch(&self, topic: &str, args: &[Value], span: &Span) -> Result<usize, SignalError> {
        let mut invoked = 0;
        for sub in self.subscriptions.values() {
            if !sub.pattern.matches(topic) {
                continue;
            }
            for callback in &sub.callbacks {
                callback(args).map_err(SignalError::Callback)?;
                invoked += 1;
                trace!(parent: span, topic, pattern = %sub.pattern, "Callback completed");
            }
        }
        Ok(invoked)
    }
}

static NEXT_BUS_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Buses currently running callbacks on this thread.
    static DISPATCHING: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks a bus as dispatching on the current thread until dropped.
struct DispatchGuard {
    bus_id: u64,
}

impl DispatchGuard {
    fn enter(bus_id: u64) -> Self {
        DISPATCHING.with_borrow_mut(|active| active.push(bus_id));
        Self { bus_id }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with_borrow_mut(|active| {
            if let Some(pos) = active.iter().rposition(|id| *id == self.bus_id) {
                active.remove(pos);
            }
        });
    }
}

fn is_dispatching(bus_id: u64) -> bool {
    DISPATCHING.with_borrow(|active| active.contains(&bus_id))
}

struct BusInner {
    id: u64,
    state: Mutex<BusState>,
    max_pending: Option<usize>,
    span: Span,
    queued: Notify,
    pending_len: AtomicUsize,
    subscription_count: AtomicUsize,
}

/// Process-wide pub/sub bus with immediate and deferred delivery.
///
/// Cloning is cheap and every clone shares the same subscriptions and
/// queue. Create one at startup and pass it to whoever needs it.
#[derive(Clone)]
pub struct SignalBus {
    inner: Arc<BusInner>,
}

impl SignalBus {
    /// Create a bus. Its log events are parented to `span`.
    pub fn new(config: &SignalsConfig, span: Span) -> Self {
        Self {
            inner: Arc::new(BusInner {
                id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
                state: Mutex::new(BusState::default()),
                max_pending: config.max_pending,
                span,
                queued: Notify::new(),
                pending_len: AtomicUsize::new(0),
                subscription_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Register `callback` for every topic matching `pattern`.
    ///
    /// Registrations are permanent. Calling this from inside a callback of
    /// the same bus is refused and logged.
    pub fn subscribe(&self, pattern: impl Into<String>, callback: Callback) {
        let pattern = pattern.into();
        let span = &self.inner.span;
        if is_dispatching(self.inner.id) {
            error!(parent: span, %pattern, "Subscribe called from inside a signal callback, ignoring");
            return;
        }

        let mut state = self.inner.state.lock();
        let subscription = state
            .subscriptions
            .entry(pattern.clone())
            .or_insert_with(|| Subscription {
                pattern: TopicPattern::new(pattern.as_str()),
                callbacks: Vec::new(),
            });
        subscription.callbacks.push(callback);
        let callbacks = subscription.callbacks.len();
        self.inner.subscription_count.fetch_add(1, Ordering::Relaxed);
        drop(state);

        debug!(parent: span, %pattern, callbacks, "Callback registered");
    }

    /// Closure form of [`subscribe`](Self::subscribe).
    pub fn subscribe_fn<F>(&self, pattern: impl Into<String>, callback: F)
    where
        F: Fn(&[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(pattern, Arc::new(callback));
    }

    /// Deliver `topic` to all matching callbacks now.
    ///
    /// Returns the first callback error unchanged; callbacks after the
    /// failing one are not run. A topic nobody listens to is not an error.
    pub fn emit(&self, topic: &str, args: &[Value]) -> Result<(), SignalError> {
        self.ensure_not_reentrant()?;
        let span = &self.inner.span;

        let state = self.inner.state.lock();
        let _dispatching = DispatchGuard::enter(self.inner.id);
        match state.dispatch(topic, args, span) {
            Ok(invoked) => {
                debug!(parent: span, topic, invoked, "Signal emitted");
                Ok(())
            }
            Err(e) => {
                debug!(parent: span, topic, error = %e, "Signal emit aborted by callback");
                Err(e)
            }
        }
    }

    /// Queue `topic` for delivery on the next [`process_queue`](Self::process_queue).
    ///
    /// Fails without queueing when no registered pattern matches `topic`,
    /// or when the queue is at its configured capacity.
    pub fn after_transaction(
        &self,
        topic: impl Into<String>,
        args: SignalArgs,
    ) -> Result<(), SignalError> {
        let topic = topic.into();
        self.ensure_not_reentrant()?;

        let mut state = self.inner.state.lock();
        if !state.has_match(&topic) {
            return Err(SignalError::NoSubscribers { topic });
        }
        if let Some(capacity) = self.inner.max_pending {
            if state.queue.len() >= capacity {
                return Err(SignalError::QueueFull { topic, capacity });
            }
        }

        debug!(parent: &self.inner.span, %topic, "Event queued");
        state.queue.push_back(PendingEvent { topic, args });
        self.inner
            .pending_len
            .store(state.queue.len(), Ordering::Relaxed);
        drop(state);

        self.inner.queued.notify_one();
        Ok(())
    }

    /// Drain the deferred queue in FIFO order.
    ///
    /// Every dequeued event is removed whether or not its callbacks
    /// succeed. A failing callback is logged and stops only that event's
    /// chain; the remaining events are still delivered. Callback errors are
    /// never returned, only counted in the summary.
    pub fn process_queue(&self) -> Result<FlushSummary, SignalError> {
        self.ensure_not_reentrant()?;
        let span = &self.inner.span;

        let mut state = self.inner.state.lock();
        let _dispatching = DispatchGuard::enter(self.inner.id);
        let mut summary = FlushSummary::default();
        while let Some(event) = state.queue.pop_front() {
            self.inner
                .pending_len
                .store(state.queue.len(), Ordering::Relaxed);
            summary.processed += 1;
            if let Err(e) = state.dispatch(&event.topic, &event.args, span) {
                summary.failed += 1;
                error!(parent: span, topic = %event.topic, error = %e, "Error processing queued event");
            }
        }

        if summary.processed > 0 {
            debug!(
                parent: span,
                processed = summary.processed,
                failed = summary.failed,
                "Signal queue drained"
            );
        }
        Ok(summary)
    }

    /// Whether any registered pattern matches `topic`.
    pub fn has_subscribers(&self, topic: &str) -> Result<bool, SignalError> {
        self.ensure_not_reentrant()?;
        Ok(self.inner.state.lock().has_match(topic))
    }

    /// Number of events waiting in the queue.
    pub fn pending_len(&self) -> usize {
        self.inner.pending_len.load(Ordering::Relaxed)
    }

    /// Number of callbacks registered across all patterns.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscription_count.load(Ordering::Relaxed)
    }

    /// Wait until an event has been queued.
    ///
    /// A notification sent while nobody is waiting is kept, so an event
    /// queued between two waits is not missed.
    pub async fn notified(&self) {
        self.inner.queued.notified().await;
    }

    fn ensure_not_reentrant(&self) -> Result<(), SignalError> {
        if is_dispatching(self.inner.id) {
            return Err(SignalError::Reentrant);
        }
        Ok(())
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(&SignalsConfig::default(), tracing::info_span!("signals"))
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("id", &self.inner.id)
            .field("subscriptions", &self.subscription_count())
            .field("pending", &self.pending_len())
            .finish_non_exhaustive()
    }
}
