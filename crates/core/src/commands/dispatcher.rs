//! Message dispatcher
//!
//! Turns incoming messages into command invocations:
//!
//! ```text
//! event → prefix → candidates → match → permissions → cooldown → handler → listeners
//! ```
//!
//! Matching runs on the calling thread against an immutable registry
//! snapshot. Commands flagged `execute_async` then run on the worker pool;
//! every other command runs before [`Dispatcher::handle`] returns, so a slow
//! handler holds up the next message from the same source.
//!
//! # Example
//!
//! ```ignore
//! use chatroute_core::commands::{CommandBuilder, CommandRegistry, Dispatcher};
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(CommandBuilder::new("ping").handler(|ctx| {
//!     ctx.reply("Pong!");
//!     Ok(())
//! }))?;
//!
//! let dispatcher = Dispatcher::new(registry);
//! dispatcher.handle(event);
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::context::{Arguments, DispatchContext};
use super::cooldown::CooldownLedger;
use super::event::{send_logged, send_private_logged, MessageEvent};
use super::help::{self, HelpHook, HelpRequest};
use super::listener::{CommandEventListener, ListenerKey, ListenerRegistry};
use super::matcher::{find_match, MatchResult};
use super::prefix::{self, PrefixHook, DEFAULT_PREFIX};
use super::registry::{CommandKey, CommandRegistry};
use super::specificity::sort_candidates;
use crate::config::{ConfigResult, DispatcherConfig};
use crate::error::{CommandError, DispatchError};
use crate::permissions::{self, Permissions};
use crate::tasks::WorkerPool;

/// What happened to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message did not start with a prefix
    Ignored,
    /// The bot was asked for its prefixes
    PrefixQuery,
    /// A command ran to completion on the calling thread
    Executed,
    /// A command was queued on the worker pool
    Scheduled,
    /// The command's handler failed
    Failed,
    /// No command matched; usage help was sent
    Help,
    /// No command matched and no help was sent
    NoMatch,
    /// The bot lacks these permissions
    PermissionDenied(Permissions),
    /// The invoker must wait this long before using the command again
    CooldownActive(Duration),
}

impl DispatchOutcome {
    /// Returns true if the message was treated as a command
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Ignored | Self::NoMatch)
    }
}

impl From<DispatchError> for DispatchOutcome {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::PermissionDenied(missing) => Self::PermissionDenied(missing),
            DispatchError::CooldownActive(remaining) => Self::CooldownActive(remaining),
            DispatchError::Handler(_) | DispatchError::Pool(_) => Self::Failed,
        }
    }
}

/// Routes messages to registered commands
///
/// All methods take `&self`; a dispatcher can be shared between event
/// sources behind an `Arc`.
pub struct Dispatcher {
    /// Current registry snapshot
    registry: RwLock<Arc<CommandRegistry>>,

    /// Default prefixes, longest first
    prefixes: RwLock<Vec<String>>,

    prefix_hook: RwLock<Option<PrefixHook>>,
    help_hook: RwLock<Option<HelpHook>>,
    help_enabled: AtomicBool,

    /// Users allowed to run developer commands
    developers: RwLock<HashSet<u64>>,

    /// Permissions every command needs
    generic_permissions: RwLock<Permissions>,

    /// Sent to the invoker when a handler fails
    failure_message: RwLock<Option<String>>,

    listeners: Arc<ListenerRegistry>,
    cooldowns: Arc<CooldownLedger>,
    pool: WorkerPool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(CommandRegistry::new())
    }
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry) -> Self {
        Self::with_pool(registry, WorkerPool::default())
    }

    /// Create a dispatcher with the settings of `config`
    ///
    /// Fails if the config names an unknown permission.
    pub fn from_config(registry: CommandRegistry, config: &DispatcherConfig) -> ConfigResult<Self> {
        let generic_permissions = config.generic_permissions()?;

        let dispatcher = Self::with_pool(registry, WorkerPool::new(config.pool_idle_timeout()));
        dispatcher.set_prefixes(config.prefixes.clone());
        dispatcher.set_help_enabled(config.help_enabled);
        dispatcher.set_developers(config.developers.iter().copied());
        dispatcher.set_generic_permissions(generic_permissions);
        Ok(dispatcher)
    }

    fn with_pool(registry: CommandRegistry, pool: WorkerPool) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            prefixes: RwLock::new(vec![DEFAULT_PREFIX.to_string()]),
            prefix_hook: RwLock::new(None),
            help_hook: RwLock::new(None),
            help_enabled: AtomicBool::new(true),
            developers: RwLock::new(HashSet::new()),
            generic_permissions: RwLock::new(Permissions::empty()),
            failure_message: RwLock::new(None),
            listeners: Arc::new(ListenerRegistry::default()),
            cooldowns: Arc::new(CooldownLedger::new()),
            pool,
        }
    }

    /// Current registry snapshot
    pub fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.registry.read())
    }

    /// Replace the registry
    ///
    /// Dispatches already in progress finish against the old snapshot.
    /// Cooldowns are reset since they are keyed by the old registry's
    /// command keys.
    pub fn set_registry(&self, registry: CommandRegistry) {
        *self.registry.write() = Arc::new(registry);
        self.cooldowns.clear();
        tracing::info!("Command registry replaced");
    }

    /// Set the default prefixes
    pub fn set_prefixes(&self, mut prefixes: Vec<String>) {
        prefix::sort_longest_first(&mut prefixes);
        *self.prefixes.write() = prefixes;
    }

    /// Default prefixes, longest first
    pub fn prefixes(&self) -> Vec<String> {
        self.prefixes.read().clone()
    }

    pub fn set_prefix_hook(&self, hook: Option<PrefixHook>) {
        *self.prefix_hook.write() = hook;
    }

    pub fn set_help_hook(&self, hook: Option<HelpHook>) {
        *self.help_hook.write() = hook;
    }

    pub fn set_help_enabled(&self, enabled: bool) {
        self.help_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_help_enabled(&self) -> bool {
        self.help_enabled.load(Ordering::Relaxed)
    }

    /// Replace the users allowed to run developer commands
    pub fn set_developers<I>(&self, developers: I)
    where
        I: IntoIterator<Item = u64>,
    {
        *self.developers.write() = developers.into_iter().collect();
    }

    pub fn is_developer(&self, user: u64) -> bool {
        self.developers.read().contains(&user)
    }

    /// Set the permissions every command needs in addition to its own
    pub fn set_generic_permissions(&self, permissions: Permissions) {
        *self.generic_permissions.write() = permissions;
    }

    pub fn generic_permissions(&self) -> Permissions {
        *self.generic_permissions.read()
    }

    /// Message sent to the invoker when a handler fails, `None` to stay quiet
    pub fn set_failure_message(&self, message: Option<String>) {
        *self.failure_message.write() = message;
    }

    /// Register a lifecycle listener
    pub fn add_listener(&self, listener: Arc<dyn CommandEventListener>) -> ListenerKey {
        self.listeners.add(listener)
    }

    /// Remove a lifecycle listener
    ///
    /// Returns true if the listener was registered.
    pub fn remove_listener(&self, key: ListenerKey) -> bool {
        self.listeners.remove(key)
    }

    /// Currently registered listeners
    pub fn listeners(&self) -> Vec<Arc<dyn CommandEventListener>> {
        self.listeners.snapshot()
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        &self.cooldowns
    }

    /// Stop the worker pool, waiting for queued asynchronous commands
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    /// Handle a message
    ///
    /// Returns true if the message was treated as a command, including the
    /// prefix query.
    pub fn handle(&self, event: Arc<dyn MessageEvent>) -> bool {
        self.dispatch(event).is_handled()
    }

    /// Handle a message and report what happened
    pub fn dispatch(&self, event: Arc<dyn MessageEvent>) -> DispatchOutcome {
        let started = Instant::now();
        let prefixes = self.prefixes_for(event.as_ref());
        let content = event.content();

        let Some(resolved) = prefix::resolve(content, event.self_id(), &prefixes) else {
            return DispatchOutcome::Ignored;
        };
        let text = &content[resolved.as_str().len()..];

        if resolved.is_mention() && prefix::is_prefix_query(text) {
            send_logged(event.as_ref(), &help::render_prefixes(&prefixes));
            return DispatchOutcome::PrefixQuery;
        }

        let registry = self.registry();
        let author = event.author_id();
        let mut candidates = {
            let developers = self.developers.read();
            registry.candidates(|command| !command.is_developer_only() || developers.contains(&author))
        };
        sort_candidates(&mut candidates, &registry);

        let found = match find_match(&registry, &candidates, text, event.as_ref()) {
            MatchResult::Found(found) => found,
            MatchResult::NotFound { possible } => {
                return self.help(event.as_ref(), resolved.as_str(), text, &registry, &possible);
            }
        };

        let is_async = match registry.get(found.key) {
            Some(command) => command.is_async(),
            None => return DispatchOutcome::NoMatch,
        };

        let context = DispatchContext::new(
            Arc::clone(&event),
            resolved.into_string(),
            found.trigger,
            found.key,
            Arguments::new(found.arguments),
            Arc::clone(&registry),
        );

        if let Err(error) = self.check_permissions(&context) {
            return error.into();
        }

        let execution = self.execution(context, started);
        if is_async {
            match self.pool.submit(move || {
                let _ = execution.run();
            }) {
                Ok(()) => DispatchOutcome::Scheduled,
                Err(e) => {
                    tracing::error!("Failed to schedule command: {}", e);
                    DispatchError::from(e).into()
                }
            }
        } else {
            match execution.run() {
                Ok(()) => DispatchOutcome::Executed,
                Err(error) => error.into(),
            }
        }
    }

    /// Run an already matched command on the calling thread
    ///
    /// Applies the permission check and the cooldown, ignoring the
    /// command's `execute_async` flag.
    pub fn execute(&self, context: DispatchContext) -> Result<(), DispatchError> {
        self.check_permissions(&context)?;
        self.execution(context, Instant::now()).run()
    }

    fn execution(&self, context: DispatchContext, started: Instant) -> Execution {
        Execution {
            context,
            listeners: Arc::clone(&self.listeners),
            cooldowns: Arc::clone(&self.cooldowns),
            failure_message: self.failure_message.read().clone(),
            started,
        }
    }

    fn prefixes_for(&self, event: &dyn MessageEvent) -> Vec<String> {
        let hook = self.prefix_hook.read().clone();
        if let Some(hook) = hook {
            match hook(event) {
                Some(mut prefixes) => {
                    prefix::sort_longest_first(&mut prefixes);
                    return prefixes;
                }
                None => tracing::warn!("Prefix hook returned no prefixes, using the defaults"),
            }
        }
        self.prefixes()
    }

    fn check_permissions(&self, context: &DispatchContext) -> Result<(), DispatchError> {
        let event = context.event();
        let Some(effective) = event.bot_permissions() else {
            return Ok(());
        };
        let Some(command) = context.command() else {
            return Ok(());
        };

        let required = self.generic_permissions() | command.bot_permissions();
        let missing = permissions::missing(required, effective);
        if missing.is_empty() {
            return Ok(());
        }

        let names = missing.display_names();
        tracing::warn!(
            "Missing {} to execute '{}' in {}",
            names.join(", "),
            context.trigger(),
            event.channel_name()
        );

        let message = format!(
            "Missing permission{} to execute **{}** in {}, {}\n```\n{}\n```",
            if names.len() > 1 { "s" } else { "" },
            context.trigger(),
            event.channel_name(),
            event.guild_name().unwrap_or_default(),
            names.join("\n")
        );
        // Without Send Messages the author is told privately
        if permissions::missing(Permissions::SEND_MESSAGES, effective).is_empty() {
            send_logged(event, &message);
        } else {
            send_private_logged(event, &message);
        }

        Err(DispatchError::PermissionDenied(missing))
    }

    fn help(
        &self,
        event: &dyn MessageEvent,
        prefix: &str,
        text: &str,
        registry: &CommandRegistry,
        possible: &[CommandKey],
    ) -> DispatchOutcome {
        if possible.is_empty() || !self.is_help_enabled() {
            return DispatchOutcome::NoMatch;
        }

        if let Some(effective) = event.bot_permissions() {
            let missing = permissions::missing(Permissions::SEND_MESSAGES, effective);
            if !missing.is_empty() {
                let guild = event.guild_name().unwrap_or_default();
                tracing::warn!(
                    "Cannot send help in {}, {}: missing Send Messages",
                    event.channel_name(),
                    guild
                );
                send_private_logged(
                    event,
                    &format!(
                        "Missing permission **Send Messages** in {}, {}",
                        event.channel_name(),
                        guild
                    ),
                );
                return DispatchOutcome::PermissionDenied(missing);
            }
        }

        let request = HelpRequest {
            prefix,
            content: text,
            registry,
            possible,
        };

        let hook = self.help_hook.read().clone();
        let message = match hook {
            Some(hook) => hook(event, &request).unwrap_or_else(|| {
                tracing::warn!("Help hook returned no message, using the default help");
                help::render_default(&request)
            }),
            None => help::render_default(&request),
        };

        send_logged(event, &message);
        DispatchOutcome::Help
    }
}

/// A matched command ready to run, on the calling thread or a worker
struct Execution {
    context: DispatchContext,
    listeners: Arc<ListenerRegistry>,
    cooldowns: Arc<CooldownLedger>,
    failure_message: Option<String>,
    /// When the message arrived
    started: Instant,
}

impl Execution {
    fn run(self) -> Result<(), DispatchError> {
        let context = &self.context;
        let Some(command) = context.command() else {
            return Ok(());
        };

        let key = context.command_key();
        let invoker = context.author_id();
        let cooldown = command.cooldown();

        // Taken before the handler runs so a slow handler can't be entered twice
        if !cooldown.is_zero() {
            if let Err(remaining) = self.cooldowns.try_start(key, cooldown, invoker) {
                context.reply(&format!(
                    "This command has a cooldown, please try again in {:.3} seconds",
                    remaining.as_secs_f64()
                ));
                return Err(DispatchError::CooldownActive(remaining));
            }
        }

        let result = catch_unwind(AssertUnwindSafe(|| command.run(context)))
            .unwrap_or_else(|payload| Err(CommandError::Panicked(panic_message(&*payload))));

        let elapsed = self.started.elapsed();
        match result {
            Ok(()) => {
                tracing::info!(
                    "Executed command ({}) with {} argument(s), time elapsed {:?}",
                    context.trigger(),
                    context.args().len(),
                    elapsed
                );
                self.listeners.notify_executed(command, context);
                Ok(())
            }
            Err(error) => {
                if !cooldown.is_zero() {
                    self.cooldowns.cancel(key, invoker);
                }

                if let CommandError::MissingPermissions(missing) = &error {
                    tracing::warn!(
                        "Command ({}) failed due to missing permissions {:?}, time elapsed {:?}",
                        context.trigger(),
                        missing,
                        elapsed
                    );
                    context.reply("Missing permissions");
                } else {
                    tracing::error!(
                        "Command ({}) with {} argument(s) failed: {}, time elapsed {:?}",
                        context.trigger(),
                        context.args().len(),
                        error,
                        elapsed
                    );
                    self.listeners.notify_failed(command, context, &error);
                    if let Some(message) = &self.failure_message {
                        context.reply(message);
                    }
                }

                Err(DispatchError::Handler(error))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
