//! Round-robin reverse-proxy load balancer.
//!
//! Inbound requests are dispatched to a pool of backend origins: the pool
//! advances a shared round-robin cursor, the selected backend's proxy
//! handle forwards the request, and a forwarding failure marks the backend
//! dead and triggers at most one re-dispatch. A background health checker
//! probes every registered backend on a fixed interval and keeps the
//! aliveness flags current.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod pool;
pub mod proxy;

pub use config::Config;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
