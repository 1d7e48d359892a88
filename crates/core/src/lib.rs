//! chatroute - Core Logic
//!
//! Routes incoming chat messages to registered command handlers: prefix
//! resolution, command matching, argument verification, permission and
//! cooldown checks, and synchronous or pooled execution.
//!
//! The chat platform is reached only through [`MessageEvent`]; this crate
//! has no network code of its own.

pub mod commands;
pub mod config;
pub mod error;
pub mod permissions;
pub mod tasks;

// Re-export commonly used items
pub use commands::{
    verifiers, Argument, CommandBuilder, CommandEventListener, CommandKey, CommandRegistry,
    DispatchContext, DispatchOutcome, Dispatcher, ListenerKey, MessageEvent, Verification,
};

// Re-export error types
pub use error::{CommandError, DispatchError, RegistryError, SendError};

// Re-export config types
pub use config::{ConfigError, ConfigResult, DispatcherConfig};

// Re-export permission types
pub use permissions::Permissions;

// Re-export pool types
pub use tasks::{PoolError, WorkerPool};
