//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single origin server
//! - Track aliveness (written by the health checker and the dispatcher)
//! - Hold the forwarding handle bound to the origin

use std::sync::atomic::{AtomicBool, Ordering};

use url::Url;

use crate::proxy::ProxyHandle;

/// A single backend origin.
///
/// The URL and proxy handle are fixed at construction; only the aliveness
/// flag mutates, so it is a lone atomic rather than a lock.
#[derive(Debug)]
pub struct Backend {
    url: Url,
    alive: AtomicBool,
    proxy: ProxyHandle,
}

impl Backend {
    /// Create a backend bound to `url`. Backends start alive.
    pub fn new(url: Url, proxy: ProxyHandle) -> Self {
        Self {
            url,
            alive: AtomicBool::new(true),
            proxy,
        }
    }

    /// The origin's base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Set the aliveness flag.
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Relaxed);
    }

    /// Read the aliveness flag.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// The forwarding handle bound to this origin.
    pub fn proxy(&self) -> &ProxyHandle {
        &self.proxy
    }
}
