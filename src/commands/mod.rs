//! Host-facing command layer
//!
//! Plain async functions returning `Result<_, String>` so any host bridge can
//! forward them. Sessions live in a process-wide registry keyed by id.

pub mod config;
pub mod session;

pub use config::*;
pub use session::*;
