//! Per-invocation context handed to command handlers

use std::any::Any;
use std::sync::Arc;

use super::argument::Value;
use super::command::Command;
use super::event::{send_logged, MessageEvent};
use super::registry::{CommandKey, CommandRegistry};

/// Verified argument values of an invocation
///
/// Values appear in declaration order. An argument that was never filled
/// (processing ended early) is absent.
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get the value at `index` if it exists and has type `T`
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Get the raw value at `index`
    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Information about a command invocation
pub struct DispatchContext {
    /// Message that triggered the command
    event: Arc<dyn MessageEvent>,

    /// Prefix the message started with
    prefix: String,

    /// Trigger text as it appeared in the message
    trigger: String,

    /// Matched command
    command: CommandKey,

    /// Verified argument values
    arguments: Arguments,

    /// Registry snapshot the command was matched against
    registry: Arc<CommandRegistry>,
}

impl DispatchContext {
    pub fn new(
        event: Arc<dyn MessageEvent>,
        prefix: String,
        trigger: String,
        command: CommandKey,
        arguments: Arguments,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            event,
            prefix,
            trigger,
            command,
            arguments,
            registry,
        }
    }

    pub fn event(&self) -> &dyn MessageEvent {
        self.event.as_ref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Trigger as typed by the invoker, e.g. `r info`
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn command_key(&self) -> CommandKey {
        self.command
    }

    /// The matched command
    ///
    /// Returns `None` only if the command was removed from the snapshot,
    /// which cannot happen as snapshots are immutable.
    pub fn command(&self) -> Option<&Command> {
        self.registry.get(self.command)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn args(&self) -> &Arguments {
        &self.arguments
    }

    /// Get the argument at `index` as `T`
    pub fn arg<T: Any>(&self, index: usize) -> Option<&T> {
        self.arguments.get(index)
    }

    /// Id of the invoking user
    pub fn author_id(&self) -> u64 {
        self.event.author_id()
    }

    /// Reply in the channel the command was used in
    ///
    /// Delivery failures are logged and otherwise ignored.
    pub fn reply(&self, message: &str) {
        send_logged(self.event.as_ref(), message);
    }

    /// Reply with formatted message
    pub fn reply_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.reply(&args.to_string());
    }
}
