//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! SIGINT/SIGTERM (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → listener stops accepting, drains in-flight requests (10s grace)
//!     → health checker stops scheduling ticks
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the signal out to every long-running task
//! - The shutdown grace period is bounded; exceeding it is fatal

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
