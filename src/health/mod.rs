//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Ticker (20s)
//!     → snapshot the registry
//!     → one probe task per backend (bounded GET, 2s)
//!     → mark_backend_status(alive iff status 200)
//! ```
//!
//! # Design Decisions
//! - Probes scan the registry by snapshot rather than re-entering the
//!   shared round-robin cursor, so each tick probes every backend exactly
//!   once even under live traffic
//! - One task per probe; a hanging backend cannot delay the others
//! - Fire-and-forget: shutdown stops new ticks without awaiting probes

pub mod checker;

pub use checker::HealthChecker;
