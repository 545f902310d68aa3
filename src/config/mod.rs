//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs (read + parse)
//!     → validation.rs (semantic checks, all errors collected)
//!     → schema.rs Config handed to startup wiring
//! ```
//!
//! # Design Decisions
//! - Serde handles syntax, validation handles semantics
//! - A malformed backend URL is fatal before the listener binds
//! - An empty backend list is accepted; the dispatcher answers 503

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::Config;
