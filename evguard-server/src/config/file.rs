//! TOML file configuration structures.
//!
//! These structs directly map to the `evguard-config.toml` file format.
//! Every section is optional and falls back to its defaults.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Signal bus configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsConfig {
    /// Cap on pending deferred events. Omit for an unbounded queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pending: Option<usize>,
    /// Drain the queue from a background task as events arrive.
    #[serde(default)]
    pub background_flush: bool,
    /// Number of deliveries kept by the audit trail.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            max_pending: None,
            background_flush: false,
            audit_capacity: default_audit_capacity(),
        }
    }
}

fn default_audit_capacity() -> usize {
    evguard_core::config::DEFAULT_AUDIT_CAPACITY
}
