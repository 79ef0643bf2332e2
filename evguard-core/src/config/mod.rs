//! Configuration types for eventsguard.
//!
//! These types represent the validated runtime configuration. Loading and
//! parsing the TOML file is handled by the server crate, which hands the
//! result to each component's constructor.

mod server;
mod signals;

pub use server::ServerConfig;
pub use signals::{DEFAULT_AUDIT_CAPACITY, SignalsConfig};

/// Validated configuration for one process.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Signal bus and subscriber settings.
    pub signals: SignalsConfig,
}
