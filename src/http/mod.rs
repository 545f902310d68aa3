//! HTTP listener and request dispatch.

pub mod server;

pub use server::{HttpServer, ServerError};
