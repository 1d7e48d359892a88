//! Command lifecycle listeners
//!
//! Listeners are notified after a command ran, or after its handler failed.
//! They run on the thread that ran the command. A panicking listener is
//! logged and skipped; it never reaches the dispatcher.
//!
//! # Example
//!
//! ```ignore
//! struct Audit;
//!
//! impl CommandEventListener for Audit {
//!     fn on_command_executed(&self, command: &Command, context: &DispatchContext) {
//!         tracing::info!("{} used {}", context.author_id(), command.trigger());
//!     }
//! }
//!
//! let key = dispatcher.add_listener(Arc::new(Audit));
//! dispatcher.remove_listener(key);
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use super::command::Command;
use super::context::DispatchContext;
use crate::error::CommandError;

new_key_type! {
    /// Key for registered listeners, used for removal
    pub struct ListenerKey;
}

/// Receives command lifecycle notifications
pub trait CommandEventListener: Send + Sync {
    /// The command's handler returned successfully
    fn on_command_executed(&self, _command: &Command, _context: &DispatchContext) {}

    /// The command's handler failed
    fn on_command_failed(&self, _command: &Command, _context: &DispatchContext, _error: &CommandError) {}
}

/// Registry of lifecycle listeners
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: RwLock<SlotMap<ListenerKey, Arc<dyn CommandEventListener>>>,
}

impl ListenerRegistry {
    /// Add a listener
    ///
    /// Adding the same listener twice returns the existing key.
    pub fn add(&self, listener: Arc<dyn CommandEventListener>) -> ListenerKey {
        let mut listeners = self.listeners.write();
        if let Some((key, _)) = listeners.iter().find(|(_, l)| Arc::ptr_eq(*l, &listener)) {
            return key;
        }
        listeners.insert(listener)
    }

    /// Remove a listener by its key
    ///
    /// Returns `true` if the listener was found and removed.
    pub fn remove(&self, key: ListenerKey) -> bool {
        self.listeners.write().remove(key).is_some()
    }

    /// Copy of the current listeners
    ///
    /// Notifications iterate over a snapshot, so listeners may add or
    /// remove listeners while being notified.
    pub fn snapshot(&self) -> Vec<Arc<dyn CommandEventListener>> {
        self.listeners.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Fire `on_command_executed` on every listener
    pub fn notify_executed(&self, command: &Command, context: &DispatchContext) {
        for listener in self.snapshot() {
            let result = catch_unwind(AssertUnwindSafe(|| {
                listener.on_command_executed(command, context)
            }));
            if result.is_err() {
                tracing::error!("Listener panicked in on_command_executed for '{}'", context.trigger());
            }
        }
    }

    /// Fire `on_command_failed` on every listener
    pub fn notify_failed(&self, command: &Command, context: &DispatchContext, error: &CommandError) {
        for listener in self.snapshot() {
            let result = catch_unwind(AssertUnwindSafe(|| {
                listener.on_command_failed(command, context, error)
            }));
            if result.is_err() {
                tracing::error!("Listener panicked in on_command_failed for '{}'", context.trigger());
            }
        }
    }
}
