//! Error types for command registration, execution and dispatch

use std::error::Error as StdError;
use std::time::Duration;

use crate::permissions::Permissions;

/// Error raised while registering a command
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Command was built without any trigger
    #[error("Command has no trigger")]
    NoTrigger,

    /// A trigger or alias was empty or only whitespace
    #[error("Empty trigger in command '{0}'")]
    EmptyTrigger(String),

    /// Only the last argument of a command may consume the rest of the message
    #[error("Endless argument '{argument}' must be the last argument of '{command}'")]
    EndlessNotLast { command: String, argument: String },

    /// A dispatchable command has no handler to run
    #[error("Command '{0}' is not passive but has no handler")]
    MissingHandler(String),

    /// Parent key does not belong to this registry
    #[error("Unknown parent command")]
    UnknownParent,
}

/// Error returned by a command handler
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Handler failed with a plain message
    #[error("{0}")]
    Message(String),

    /// The platform refused an action the handler attempted
    #[error("Missing permissions: {0:?}")]
    MissingPermissions(Permissions),

    /// Handler panicked; the payload is captured as text
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// Any other error raised by the handler
    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl CommandError {
    /// Create a message error
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for CommandError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// Terminal outcome of a single invocation that did not run to completion
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The bot lacks permissions the command needs in this channel
    #[error("Missing bot permissions: {0:?}")]
    PermissionDenied(Permissions),

    /// The invoker must wait before using the command again
    #[error("Command on cooldown for another {0:?}")]
    CooldownActive(Duration),

    /// The handler itself failed
    #[error("Command failed: {0}")]
    Handler(#[source] CommandError),

    /// The worker pool refused the job
    #[error(transparent)]
    Pool(#[from] crate::tasks::PoolError),
}

/// Error returned by an event source when a message could not be delivered
#[derive(Debug, thiserror::Error)]
#[error("Failed to send message: {0}")]
pub struct SendError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::EndlessNotLast {
            command: "say".to_string(),
            argument: "text".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Endless argument 'text' must be the last argument of 'say'"
        );

        assert_eq!(CommandError::from("boom").to_string(), "boom");
        assert_eq!(SendError("closed".into()).to_string(), "Failed to send message: closed");
    }

    #[test]
    fn test_handler_error_source() {
        let err = DispatchError::Handler(CommandError::msg("inner"));
        let source = StdError::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("inner"));
    }
}
