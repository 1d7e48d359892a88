//! Command registry - registration and candidate enumeration

use slotmap::{new_key_type, SlotMap};

use super::command::{Command, CommandBuilder};
use crate::error::RegistryError;

new_key_type! {
    /// Handle for a registered command
    pub struct CommandKey;
}

/// A trigger string paired with the command it invokes
///
/// `arity` is the number of leading arguments this form uses. It is lower
/// than the command's argument count for the synthetic forms generated
/// for trailing arguments with default values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub trigger: String,
    pub key: CommandKey,
    pub arity: usize,
}

impl MatchCandidate {
    /// Returns true if this form leaves out defaulted arguments of `command`
    pub fn is_synthetic(&self, command: &Command) -> bool {
        self.arity < command.arguments().len()
    }
}

/// Forest of registered commands
///
/// Commands own their children through the registry; parents are only
/// referenced by key.
pub struct CommandRegistry {
    /// Commands indexed by key
    commands: SlotMap<CommandKey, Command>,

    /// Top level commands in registration order
    roots: Vec<CommandKey>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    /// Register a top level command and its subcommands
    ///
    /// Fails if any command in the tree is invalid. Several commands may
    /// share a trigger; the most specific one is tried first when matching.
    pub fn register(&mut self, builder: CommandBuilder) -> Result<CommandKey, RegistryError> {
        let key = self.insert(builder, None)?;
        self.roots.push(key);
        Ok(key)
    }

    /// Register a subcommand under an existing command
    pub fn register_child(
        &mut self,
        parent: CommandKey,
        builder: CommandBuilder,
    ) -> Result<CommandKey, RegistryError> {
        if !self.commands.contains_key(parent) {
            return Err(RegistryError::UnknownParent);
        }

        let key = self.insert(builder, Some(parent))?;
        self.commands[parent].children.push(key);
        Ok(key)
    }

    fn insert(
        &mut self,
        builder: CommandBuilder,
        parent: Option<CommandKey>,
    ) -> Result<CommandKey, RegistryError> {
        let (mut command, children) = builder.build()?;
        command.parent = parent;
        let key = self.commands.insert(command);

        for child in children {
            match self.insert(child, Some(key)) {
                Ok(child_key) => self.commands[key].children.push(child_key),
                Err(e) => {
                    self.remove_tree(key);
                    return Err(e);
                }
            }
        }

        tracing::debug!("Registered command: {}", self.commands[key].trigger());
        Ok(key)
    }

    /// Unregister a command and all of its subcommands
    pub fn unregister(&mut self, key: CommandKey) -> bool {
        let Some(parent) = self.commands.get(key).map(Command::parent) else {
            return false;
        };

        match parent {
            Some(parent) => {
                if let Some(command) = self.commands.get_mut(parent) {
                    command.children.retain(|child| *child != key);
                }
            }
            None => self.roots.retain(|root| *root != key),
        }

        self.remove_tree(key);
        true
    }

    fn remove_tree(&mut self, key: CommandKey) {
        if let Some(command) = self.commands.remove(key) {
            tracing::debug!("Unregistered command: {}", command.trigger());
            for child in command.children {
                self.remove_tree(child);
            }
        }
    }

    pub fn get(&self, key: CommandKey) -> Option<&Command> {
        self.commands.get(key)
    }

    /// Parent of a subcommand
    pub fn parent(&self, key: CommandKey) -> Option<&Command> {
        self.commands.get(key)?.parent().and_then(|p| self.commands.get(p))
    }

    /// Subcommands of a command
    pub fn children(&self, key: CommandKey) -> impl Iterator<Item = (CommandKey, &Command)> {
        self.commands
            .get(key)
            .map(|c| c.children())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.commands.get(*child).map(|c| (*child, c)))
    }

    /// Top level commands in registration order
    pub fn roots(&self) -> &[CommandKey] {
        &self.roots
    }

    /// Iterate over all registered commands
    pub fn iter(&self) -> impl Iterator<Item = (CommandKey, &Command)> {
        self.commands.iter()
    }

    /// Get total number of registered commands, subcommands included
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if no commands are registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every full trigger of a command, parent triggers included
    ///
    /// For `info` under `role` (alias `r`) this is `["role info", "r info"]`.
    pub fn trigger_chains(&self, key: CommandKey) -> Vec<String> {
        let Some(command) = self.commands.get(key) else {
            return Vec::new();
        };

        match command.parent() {
            Some(parent) => self
                .trigger_chains(parent)
                .iter()
                .flat_map(|prefix| {
                    command
                        .triggers()
                        .iter()
                        .map(move |trigger| format!("{} {}", prefix, trigger))
                })
                .collect(),
            None => command.triggers().to_vec(),
        }
    }

    /// Find a command by one of its full triggers
    pub fn find(&self, trigger: &str) -> Option<CommandKey> {
        self.commands.iter().find_map(|(key, command)| {
            self.trigger_chains(key)
                .iter()
                .any(|chain| {
                    if command.is_case_sensitive() {
                        chain == trigger
                    } else {
                        chain.to_lowercase() == trigger.to_lowercase()
                    }
                })
                .then_some(key)
        })
    }

    /// Flatten the forest into dispatchable candidates
    ///
    /// Passive commands are skipped, though their subcommands are still
    /// reachable through the passive command's triggers. `filter` can reject
    /// further commands, e.g. developer commands for regular users.
    pub fn candidates<F>(&self, filter: F) -> Vec<MatchCandidate>
    where
        F: Fn(&Command) -> bool,
    {
        let mut candidates = Vec::new();
        for root in &self.roots {
            self.collect(*root, &[], &filter, &mut candidates);
        }
        candidates
    }

    fn collect<F>(&self, key: CommandKey, prefixes: &[String], filter: &F, out: &mut Vec<MatchCandidate>)
    where
        F: Fn(&Command) -> bool,
    {
        let Some(command) = self.commands.get(key) else {
            return;
        };

        let triggers: Vec<String> = if prefixes.is_empty() {
            command.triggers().to_vec()
        } else {
            prefixes
                .iter()
                .flat_map(|prefix| {
                    command
                        .triggers()
                        .iter()
                        .map(move |trigger| format!("{} {}", prefix, trigger))
                })
                .collect()
        };

        if !command.is_passive() && filter(command) {
            let arguments = command.arguments();
            for trigger in &triggers {
                out.push(MatchCandidate {
                    trigger: trigger.clone(),
                    key,
                    arity: arguments.len(),
                });

                // Synthetic forms leaving out trailing defaulted arguments
                let mut arity = arguments.len();
                while arity > 0 && arguments[arity - 1].has_default() {
                    arity -= 1;
                    out.push(MatchCandidate {
                        trigger: trigger.clone(),
                        key,
                        arity,
                    });
                }
            }
        }

        for child in command.children() {
            self.collect(*child, &triggers, filter, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{verifiers, Argument};

    fn noop(trigger: &str) -> CommandBuilder {
        CommandBuilder::new(trigger).handler(|_| Ok(()))
    }

    fn triggers(candidates: &[MatchCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.trigger.as_str()).collect()
    }

    #[test]
    fn test_register_command() {
        let mut registry = CommandRegistry::new();
        let key = registry.register(noop("ping").alias("p")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.roots(), [key]);
        assert_eq!(registry.get(key).unwrap().trigger(), "ping");
        assert_eq!(registry.find("PING"), Some(key)); // Case insensitive
        assert_eq!(registry.find("p"), Some(key));
        assert_eq!(registry.find("pong"), None);
    }

    #[test]
    fn test_overloaded_triggers() {
        let mut registry = CommandRegistry::new();

        let first = registry.register(noop("dupe")).unwrap();
        let second = registry.register(noop("other").alias("DUPE")).unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.roots(), [first, second]);

        let keys: Vec<_> = registry
            .candidates(|_| true)
            .into_iter()
            .filter(|c| c.trigger.eq_ignore_ascii_case("dupe"))
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, [first, second]);
    }

    #[test]
    fn test_children_and_parents() {
        let mut registry = CommandRegistry::new();
        let role = registry
            .register(
                CommandBuilder::new("role")
                    .alias("r")
                    .passive()
                    .child(noop("info").alias("i"))
                    .child(noop("list")),
            )
            .unwrap();

        let children: Vec<_> = registry.children(role).map(|(k, _)| k).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(registry.parent(children[0]).unwrap().trigger(), "role");
        assert!(registry.parent(role).is_none());

        assert_eq!(
            registry.trigger_chains(children[0]),
            vec!["role info", "role i", "r info", "r i"]
        );
        assert_eq!(registry.find("r list"), Some(children[1]));
    }

    #[test]
    fn test_candidates_skip_passive() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandBuilder::new("role").alias("r").passive().child(noop("info")))
            .unwrap();
        registry.register(noop("ping")).unwrap();

        let candidates = registry.candidates(|_| true);
        assert_eq!(triggers(&candidates), vec!["role info", "r info", "ping"]);
    }

    #[test]
    fn test_candidates_filter() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("eval").developer_only()).unwrap();
        registry.register(noop("ping")).unwrap();

        let candidates = registry.candidates(|c| !c.is_developer_only());
        assert_eq!(triggers(&candidates), vec!["ping"]);
    }

    #[test]
    fn test_synthetic_forms() {
        let mut registry = CommandRegistry::new();
        let key = registry
            .register(
                noop("avatar")
                    .argument(Argument::new("size", verifiers::integer()))
                    .argument(
                        Argument::new("user", verifiers::user_mention())
                            .default_value(|event| Box::new(event.author_id())),
                    ),
            )
            .unwrap();

        let candidates = registry.candidates(|_| true);
        let arities: Vec<usize> = candidates.iter().map(|c| c.arity).collect();
        assert_eq!(arities, vec![2, 1]);

        let command = registry.get(key).unwrap();
        assert!(!candidates[0].is_synthetic(command));
        assert!(candidates[1].is_synthetic(command));
    }

    #[test]
    fn test_unregister_tree() {
        let mut registry = CommandRegistry::new();
        let role = registry
            .register(CommandBuilder::new("role").passive().child(noop("info")))
            .unwrap();
        let extra = registry.register_child(role, noop("list")).unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.unregister(extra));
        assert_eq!(registry.len(), 2);
        assert!(registry.unregister(role));
        assert!(registry.is_empty());
        assert!(registry.roots().is_empty());
        assert!(!registry.unregister(role));
    }

    #[test]
    fn test_invalid_child_rolls_back() {
        let mut registry = CommandRegistry::new();
        let result = registry.register(
            CommandBuilder::new("role")
                .passive()
                .child(noop("info"))
                .child(CommandBuilder::new("broken")),
        );

        assert!(matches!(result, Err(RegistryError::MissingHandler(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_child_unknown_parent() {
        let mut registry = CommandRegistry::new();
        let key = registry.register(noop("ping")).unwrap();
        registry.unregister(key);

        assert!(matches!(
            registry.register_child(key, noop("pong")),
            Err(RegistryError::UnknownParent)
        ));
    }
}
