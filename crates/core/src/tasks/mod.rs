//! Worker pool for commands that run off the delivering thread
//!
//! Commands flagged for asynchronous execution are queued here and the
//! dispatcher returns immediately.

pub mod pool;

pub use pool::*;
