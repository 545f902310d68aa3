//! Active liveness checking.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use tokio::sync::broadcast;
use tokio::time;

use crate::pool::{Backend, ServerPool};

/// Interval between probe rounds.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(20);

/// Per-probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Background loop that keeps backend aliveness flags current.
pub struct HealthChecker {
    pool: Arc<ServerPool>,
    client: Client<HttpConnector, Body>,
    interval: Duration,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(pool: Arc<ServerPool>, client: Client<HttpConnector, Body>) -> Self {
        Self {
            pool,
            client,
            interval: CHECK_INTERVAL,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Override the tick interval and probe timeout. Tests use this to
    /// avoid waiting out the production cadence.
    pub fn with_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.interval = interval;
        self.timeout = timeout;
        self
    }

    /// Run the probe loop until `shutdown` fires.
    ///
    /// Shutdown stops scheduling new rounds; in-flight probes are not
    /// awaited.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            backend_count = self.pool.server_count(),
            "health checker starting"
        );

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; consume it so the first
        // probe round happens one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.check_round(),
                _ = shutdown.recv() => {
                    tracing::info!("health checker stopping");
                    break;
                }
            }
        }
    }

    /// Probe every registered backend once, each in its own task.
    fn check_round(&self) {
        for backend in self.pool.all_backends() {
            let pool = self.pool.clone();
            let client = self.client.clone();
            let timeout = self.timeout;
            tokio::spawn(async move {
                let alive = probe(&client, &backend, timeout).await;
                if alive != backend.is_alive() {
                    tracing::info!(host = %backend.url(), alive, "backend status changed");
                }
                pool.mark_backend_status(&backend, alive);
            });
        }
    }
}

/// Issue a bounded GET against the backend's base URL.
///
/// Alive means the request completed without a transport error and the
/// status is exactly 200.
async fn probe(
    client: &Client<HttpConnector, Body>,
    backend: &Backend,
    timeout: Duration,
) -> bool {
    let request = match Request::builder()
        .method("GET")
        .uri(backend.url().as_str())
        .body(Body::empty())
    {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(host = %backend.url(), error = %e, "failed to build probe request");
            return false;
        }
    };

    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => response.status() == StatusCode::OK,
        Ok(Err(e)) => {
            tracing::debug!(host = %backend.url(), error = %e, "probe transport error");
            false
        }
        Err(_) => {
            tracing::debug!(host = %backend.url(), "probe timed out");
            false
        }
    }
}
