//! In-process signal bus with wildcard topics and deferred delivery.
//!
//! Domain code announces facts on string topics (`user:updated`) and
//! feature modules subscribe to topic patterns at startup. Delivery happens
//! in one of two ways:
//!
//! - [`SignalBus::emit`] runs every matching callback right away and fails
//!   fast on the first callback error.
//! - [`SignalBus::after_transaction`] records the event in a FIFO queue that
//!   is drained by [`SignalBus::process_queue`], normally by the HTTP
//!   middleware once the request has completed. Draining is best-effort
//!   across events.
//!
//! # Pattern syntax
//!
//! - `*` matches one or more characters other than `/`
//! - `#` matches any remainder, `/` included, possibly empty
//! - everything else matches literally
//!
//! # Locking
//!
//! A single mutex serializes every bus operation, callbacks included.
//! Callbacks must not call back into the bus that is running them; such
//! calls are rejected with [`SignalError::Reentrant`].

mod bus;
mod error;
mod pattern;

pub use bus::{Callback, FlushSummary, PendingEvent, SignalArgs, SignalBus};
pub use error::SignalError;
pub use pattern::{SEGMENT_SEPARATOR, TopicPattern};

/// Well-known topics emitted by the domain services.
pub mod topics {
    /// A user record was created. Args: `[user_id]`.
    pub const USER_CREATED: &str = "user:created";
    /// A user record was updated. Args: `[user_id]`.
    pub const USER_UPDATED: &str = "user:updated";
    /// A client was registered. Args: `[client_id]`.
    pub const CLIENT_CREATED: &str = "client:created";
    /// A client was updated. Args: `[client_id]`.
    pub const CLIENT_UPDATED: &str = "client:updated";
}
