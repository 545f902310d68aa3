//! Backend registry and peer selection.
//!
//! # Data Flow
//! ```text
//! Request → ServerPool::next_peer (cursor advance, modulo index)
//!     → Backend (aliveness flag + bound ProxyHandle)
//!
//! Health tick → ServerPool::all_backends
//!     → probe each → ServerPool::mark_backend_status
//! ```
//!
//! # Design Decisions
//! - Selection is strict cyclic order over insertion order; aliveness is
//!   handled by the dispatcher's retry policy, not the selector
//! - The cursor and the registry are guarded separately, so concurrent
//!   dispatches never serialize behind a structural lock

pub mod backend;
pub mod round_robin;

pub use backend::Backend;
pub use round_robin::ServerPool;
