//! Configuration schema definitions.

use serde::Deserialize;

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port the HTTP listener binds on.
    pub port: u16,

    /// Peer selection strategy. Only "round-robin" has defined behavior;
    /// unrecognized names fall back to round-robin.
    pub strategy: String,

    /// Backend origin URLs (absolute, e.g. "http://127.0.0.1:3000").
    pub backends: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            strategy: "round-robin".to_string(),
            backends: Vec::new(),
        }
    }
}
