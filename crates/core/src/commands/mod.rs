//! Chat command system
//!
//! Routes chat messages to registered command handlers.
//!
//! # Architecture
//!
//! ```text
//! MessageEvent → Dispatcher → prefix → CommandRegistry::candidates
//!              → sort_candidates → find_match → WorkerPool / caller thread
//! ```
//!
//! # Triggers
//!
//! - A message must start with one of the configured prefixes (default `!`)
//!   or with a mention of the bot
//! - Subcommands are triggered by their parent's trigger followed by their
//!   own, e.g. `!role info`
//! - When several commands could match, the most specific is tried first
//!
//! # Example
//!
//! ```ignore
//! use chatroute_core::commands::{verifiers, Argument, CommandBuilder, CommandRegistry, Dispatcher};
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(
//!     CommandBuilder::new("echo")
//!         .argument(Argument::new("text", verifiers::text()).endless())
//!         .handler(|ctx| {
//!             ctx.reply(ctx.arg::<String>(0).map(String::as_str).unwrap_or_default());
//!             Ok(())
//!         }),
//! )?;
//!
//! let dispatcher = Dispatcher::new(registry);
//! // `!echo hello there` now replies `hello there`
//! dispatcher.handle(event);
//! ```

mod argument;
mod command;
mod context;
mod cooldown;
mod dispatcher;
mod event;
pub mod help;
mod listener;
mod matcher;
pub mod prefix;
mod registry;
pub mod specificity;
pub mod tokenizer;
pub mod verifiers;

#[cfg(test)]
mod testing;

pub use argument::{Argument, ArgumentFlags, DefaultProvider, Value, Verification, Verifier};
pub use command::{Command, CommandBuilder, CommandFlags, CommandHandler};
pub use context::{Arguments, DispatchContext};
pub use cooldown::CooldownLedger;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use event::{mention_prefixes, MessageEvent};
pub use help::{HelpHook, HelpRequest};
pub use listener::{CommandEventListener, ListenerKey};
pub use matcher::{find_match, Match, MatchResult};
pub use prefix::{PrefixHook, DEFAULT_PREFIX};
pub use registry::{CommandKey, CommandRegistry, MatchCandidate};
