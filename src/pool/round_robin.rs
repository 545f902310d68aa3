//! Round-robin server pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::pool::backend::Backend;

/// Ordered backend registry with a shared round-robin cursor.
///
/// The registry is append-only after startup wiring. Structural changes
/// swap the whole vector, so selection reads never observe a torn view;
/// the cursor is an independent atomic.
pub struct ServerPool {
    backends: ArcSwap<Vec<Arc<Backend>>>,
    cursor: AtomicU64,
}

impl ServerPool {
    /// Create a pool for the named strategy. Only "round-robin" is
    /// implemented; unrecognized names fall back to it with a warning.
    pub fn new(strategy: &str) -> Self {
        match strategy {
            "round-robin" | "" => {}
            other => {
                tracing::warn!(
                    strategy = %other,
                    "unrecognized strategy, falling back to round-robin"
                );
            }
        }
        Self {
            backends: ArcSwap::from_pointee(Vec::new()),
            cursor: AtomicU64::new(0),
        }
    }

    /// Append a backend to the registry.
    pub fn add_backend(&self, backend: Arc<Backend>) {
        self.backends.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(backend.clone());
            next
        });
    }

    /// Select the next peer in cyclic order, or `None` if the registry is
    /// empty.
    ///
    /// Aliveness is not consulted here; a dead backend can be returned and
    /// the dispatcher's retry path deals with it.
    pub fn next_peer(&self) -> Option<Arc<Backend>> {
        let backends = self.backends.load();
        if backends.is_empty() {
            return None;
        }

        let next = self.cursor.fetch_add(1, Ordering::Relaxed) + 1;
        let idx = (next % backends.len() as u64) as usize;
        Some(backends[idx].clone())
    }

    /// Flip a backend's aliveness flag.
    pub fn mark_backend_status(&self, backend: &Backend, alive: bool) {
        backend.set_alive(alive);
    }

    /// Number of registered backends.
    pub fn server_count(&self) -> usize {
        self.backends.load().len()
    }

    /// Snapshot of every registered backend, in insertion order.
    ///
    /// The health checker scans this instead of draining the shared
    /// round-robin cursor, so live traffic cannot skew which backends get
    /// probed within a tick.
    pub fn all_backends(&self) -> Vec<Arc<Backend>> {
        self.backends.load().iter().cloned().collect()
    }
}
