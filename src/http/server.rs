//! HTTP server and request dispatch.
//!
//! # Responsibilities
//! - Wire startup: parse backend URLs, bind proxy handles, fill the pool
//! - Build the axum router (catch-all routes into the dispatcher)
//! - Dispatch: select a peer, forward, run the single-retry policy
//! - Graceful shutdown with a bounded drain period

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::Config;
use crate::health::HealthChecker;
use crate::lifecycle::Shutdown;
use crate::pool::{Backend, ServerPool};
use crate::proxy::{ForwardError, ProxyHandle};

/// Grace period for in-flight requests during shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Largest inbound body the dispatcher will buffer for the retry path.
const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// Errors that terminate the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid backend URL {url:?}: {source}")]
    BackendUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("failed to bind proxy handle for {url:?}: {source}")]
    ProxyBind { url: String, source: ForwardError },

    #[error("graceful shutdown exceeded {} seconds, terminating", .0.as_secs())]
    ShutdownTimeout(Duration),
}

/// Application state injected into the dispatch handler.
#[derive(Clone)]
struct AppState {
    pool: Arc<ServerPool>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    pool: Arc<ServerPool>,
    client: Client<HttpConnector, Body>,
    grace: Duration,
}

impl HttpServer {
    /// Wire the server from configuration: one registry entry with a bound
    /// proxy handle per configured origin. A malformed URL aborts startup.
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let pool = Arc::new(ServerPool::new(&config.strategy));
        for raw in &config.backends {
            let url = Url::parse(raw).map_err(|e| ServerError::BackendUrl {
                url: raw.clone(),
                source: e,
            })?;
            let proxy =
                ProxyHandle::new(url.clone(), client.clone()).map_err(|e| {
                    ServerError::ProxyBind {
                        url: raw.clone(),
                        source: e,
                    }
                })?;
            pool.add_backend(Arc::new(Backend::new(url, proxy)));
        }

        let state = AppState { pool: pool.clone() };
        let router = Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            router,
            pool,
            client,
            grace: SHUTDOWN_GRACE,
        })
    }

    /// Override the shutdown drain grace period. Tests use this to avoid
    /// waiting out the production default.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Handle to the backend registry.
    pub fn pool(&self) -> Arc<ServerPool> {
        self.pool.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests for up
    /// to the grace period. Also spawns the health checker, bound to the
    /// same shutdown signal.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend_count = self.pool.server_count(),
            "load balancer started"
        );

        let checker = HealthChecker::new(self.pool.clone(), self.client.clone());
        tokio::spawn(checker.run(shutdown.subscribe()));

        let mut drain_rx = shutdown.subscribe();
        let mut stop_rx = shutdown.subscribe();
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.recv().await;
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => result.map_err(ServerError::from),
            _ = drain_rx.recv() => {
                tracing::info!(
                    grace_secs = self.grace.as_secs(),
                    "shutdown signal received, draining in-flight requests"
                );
                match tokio::time::timeout(self.grace, serve).await {
                    Ok(result) => result.map_err(ServerError::from),
                    Err(_) => Err(ServerError::ShutdownTimeout(self.grace)),
                }
            }
        }
    }
}

/// Per-request retry state.
///
/// One re-dispatch is allowed per inbound request. The flag travels with
/// the dispatch loop rather than hiding in request extensions, which keeps
/// the at-most-once bound visible in the control flow.
#[derive(Debug, Default)]
struct RetryState {
    attempted: bool,
}

/// Per-request entry point: select a peer, forward, retry once on failure.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    // Buffer the body once so a retry can resend it.
    let body = match axum::body::to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) if is_length_limit(&e) => {
            tracing::warn!(
                remote = %remote,
                path = %path,
                "request body exceeds buffer limit"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
        Err(e) => {
            tracing::warn!(
                remote = %remote,
                path = %path,
                error = %e,
                "failed to read request body"
            );
            return (StatusCode::BAD_REQUEST, "Invalid request body").into_response();
        }
    };

    let mut retry = RetryState::default();
    loop {
        let Some(peer) = state.pool.next_peer() else {
            tracing::warn!(remote = %remote, path = %path, "no backend available");
            return service_unavailable();
        };

        match peer.proxy().forward(&parts, body.clone()).await {
            Ok(upstream) => {
                let (parts, body) = upstream.into_parts();
                return Response::from_parts(parts, Body::new(body));
            }
            Err(e) => {
                tracing::error!(
                    host = %peer.url(),
                    remote = %remote,
                    path = %path,
                    error = %e,
                    "error handling the request"
                );
                state.pool.mark_backend_status(&peer, false);

                if retry.attempted {
                    tracing::info!(
                        remote = %remote,
                        path = %path,
                        "max retry attempts reached, terminating"
                    );
                    return service_unavailable();
                }

                retry.attempted = true;
                tracing::info!(
                    remote = %remote,
                    path = %path,
                    retry = true,
                    "attempting retry"
                );
            }
        }
    }
}

fn service_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Service not available").into_response()
}

/// Whether a body-read failure was the buffer cap, as opposed to a
/// transport problem such as the client disconnecting mid-body.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
