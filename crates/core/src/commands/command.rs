//! Command definitions

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;

use super::argument::Argument;
use super::context::DispatchContext;
use super::registry::CommandKey;
use crate::error::{CommandError, RegistryError};
use crate::permissions::Permissions;

bitflags! {
    /// Flags that control how a command is matched and run
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandFlags: u8 {
        /// Trigger must match with exact case
        const CASE_SENSITIVE = 0x01;
        /// Run on the worker pool instead of the delivering thread
        const EXECUTE_ASYNC = 0x02;
        /// Never dispatched directly, only groups subcommands
        const PASSIVE = 0x04;
        /// Only offered to configured developers
        const DEVELOPER_ONLY = 0x08;
    }
}

/// Type alias for command handler functions
pub type CommandHandler = Arc<dyn Fn(&DispatchContext) -> Result<(), CommandError> + Send + Sync>;

/// A registered command
///
/// Immutable once registered. Children are owned by the registry and
/// referenced by key; `parent` is a back reference by key only.
pub struct Command {
    /// Trigger followed by its aliases
    triggers: Vec<String>,
    description: String,
    arguments: Vec<Argument>,
    flags: CommandFlags,
    cooldown: Duration,
    bot_permissions: Permissions,
    handler: Option<CommandHandler>,
    pub(super) parent: Option<CommandKey>,
    pub(super) children: Vec<CommandKey>,
}

impl Command {
    /// Primary trigger
    pub fn trigger(&self) -> &str {
        &self.triggers[0]
    }

    /// Alternative triggers
    pub fn aliases(&self) -> &[String] {
        &self.triggers[1..]
    }

    /// Trigger and aliases
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn flags(&self) -> CommandFlags {
        self.flags
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.flags.contains(CommandFlags::CASE_SENSITIVE)
    }

    pub fn is_async(&self) -> bool {
        self.flags.contains(CommandFlags::EXECUTE_ASYNC)
    }

    pub fn is_passive(&self) -> bool {
        self.flags.contains(CommandFlags::PASSIVE)
    }

    pub fn is_developer_only(&self) -> bool {
        self.flags.contains(CommandFlags::DEVELOPER_ONLY)
    }

    /// Time an invoker must wait between uses, zero for none
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Permissions the bot needs to run this command
    pub fn bot_permissions(&self) -> Permissions {
        self.bot_permissions
    }

    pub fn parent(&self) -> Option<CommandKey> {
        self.parent
    }

    pub fn children(&self) -> &[CommandKey] {
        &self.children
    }

    /// Usage text of the arguments, e.g. `<user>* [<words>]`
    pub fn argument_info(&self) -> String {
        self.arguments
            .iter()
            .map(Argument::usage)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the handler
    ///
    /// Passive commands without a handler succeed without doing anything.
    pub fn run(&self, context: &DispatchContext) -> Result<(), CommandError> {
        match &self.handler {
            Some(handler) => handler(context),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("triggers", &self.triggers)
            .field("arguments", &self.arguments)
            .field("flags", &self.flags)
            .field("cooldown", &self.cooldown)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

/// Builder for a command and its subcommands
///
/// # Example
/// ```ignore
/// use chatroute_core::commands::{verifiers, Argument, CommandBuilder};
///
/// let avatar = CommandBuilder::new("avatar")
///     .description("Get the avatar of a user")
///     .argument(Argument::new("user", verifiers::user_mention()))
///     .handler(|ctx| {
///         ctx.reply("...");
///         Ok(())
///     });
/// ```
pub struct CommandBuilder {
    triggers: Vec<String>,
    description: String,
    arguments: Vec<Argument>,
    flags: CommandFlags,
    cooldown: Duration,
    bot_permissions: Permissions,
    handler: Option<CommandHandler>,
    pub(super) children: Vec<CommandBuilder>,
}

impl CommandBuilder {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            triggers: vec![trigger.into()],
            description: String::new(),
            arguments: Vec::new(),
            flags: CommandFlags::empty(),
            cooldown: Duration::ZERO,
            bot_permissions: Permissions::empty(),
            handler: None,
            children: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.triggers.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.flags.insert(CommandFlags::CASE_SENSITIVE);
        self
    }

    pub fn execute_async(mut self) -> Self {
        self.flags.insert(CommandFlags::EXECUTE_ASYNC);
        self
    }

    pub fn passive(mut self) -> Self {
        self.flags.insert(CommandFlags::PASSIVE);
        self
    }

    pub fn developer_only(mut self) -> Self {
        self.flags.insert(CommandFlags::DEVELOPER_ONLY);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn bot_permissions(mut self, permissions: Permissions) -> Self {
        self.bot_permissions = permissions;
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DispatchContext) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Add a subcommand, reachable as `<this trigger> <child trigger>`
    pub fn child(mut self, child: CommandBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Validate and turn into a detached command (no parent, no children)
    pub(super) fn build(self) -> Result<(Command, Vec<CommandBuilder>), RegistryError> {
        let name = self.triggers.first().cloned().ok_or(RegistryError::NoTrigger)?;

        if self.triggers.iter().any(|t| t.trim().is_empty()) {
            return Err(RegistryError::EmptyTrigger(name));
        }

        let last = self.arguments.len().saturating_sub(1);
        if let Some((_, argument)) = self
            .arguments
            .iter()
            .enumerate()
            .find(|(i, a)| a.is_endless() && *i != last)
        {
            return Err(RegistryError::EndlessNotLast {
                command: name,
                argument: argument.name().to_string(),
            });
        }

        if self.handler.is_none() && !self.flags.contains(CommandFlags::PASSIVE) {
            return Err(RegistryError::MissingHandler(name));
        }

        let command = Command {
            triggers: self.triggers,
            description: self.description,
            arguments: self.arguments,
            flags: self.flags,
            cooldown: self.cooldown,
            bot_permissions: self.bot_permissions,
            handler: self.handler,
            parent: None,
            children: Vec::new(),
        };
        Ok((command, self.children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::verifiers;

    #[test]
    fn test_build_command() {
        let (command, children) = CommandBuilder::new("role info")
            .aliases(["roleinfo", "ri"])
            .description("Get information about a role")
            .argument(Argument::new("role", verifiers::text()).accept_empty(true))
            .cooldown(Duration::from_secs(5))
            .execute_async()
            .handler(|_| Ok(()))
            .build()
            .unwrap();

        assert_eq!(command.trigger(), "role info");
        assert_eq!(command.aliases(), ["roleinfo", "ri"]);
        assert_eq!(command.arguments().len(), 1);
        assert!(command.is_async());
        assert!(!command.is_passive());
        assert_eq!(command.cooldown(), Duration::from_secs(5));
        assert_eq!(command.argument_info(), "<role>");
        assert!(children.is_empty());
    }

    #[test]
    fn test_endless_must_be_last() {
        let result = CommandBuilder::new("say")
            .argument(Argument::new("text", verifiers::text()).endless())
            .argument(Argument::new("times", verifiers::integer()))
            .handler(|_| Ok(()))
            .build();

        assert!(matches!(
            result,
            Err(RegistryError::EndlessNotLast { ref argument, .. }) if argument == "text"
        ));
    }

    #[test]
    fn test_handler_required_unless_passive() {
        assert!(matches!(
            CommandBuilder::new("role").build(),
            Err(RegistryError::MissingHandler(_))
        ));
        assert!(CommandBuilder::new("role").passive().build().is_ok());
    }

    #[test]
    fn test_empty_trigger() {
        assert!(matches!(
            CommandBuilder::new("ping").alias("  ").handler(|_| Ok(())).build(),
            Err(RegistryError::EmptyTrigger(_))
        ));
    }
}
