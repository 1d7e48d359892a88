//! Message events delivered by the chat platform

use crate::error::SendError;
use crate::permissions::Permissions;

/// A received chat message together with the operations the dispatcher
/// needs from the platform
///
/// Implemented by the platform client. Events are shared with worker
/// threads for asynchronous commands, so implementations must be
/// `Send + Sync`.
pub trait MessageEvent: Send + Sync {
    /// Raw message text
    fn content(&self) -> &str;

    /// Id of the user who sent the message
    fn author_id(&self) -> u64;

    /// Id of the bot itself, used for the mention prefix
    fn self_id(&self) -> u64;

    /// Effective permissions of the bot where the message was sent
    ///
    /// `None` outside of a guild, where no permission check applies.
    fn bot_permissions(&self) -> Option<Permissions> {
        None
    }

    /// Name of the channel the message was sent in
    fn channel_name(&self) -> &str {
        ""
    }

    /// Name of the guild the message was sent in, if any
    fn guild_name(&self) -> Option<&str> {
        None
    }

    /// Send a message to the channel the event came from
    fn send(&self, message: &str) -> Result<(), SendError>;

    /// Send a private message to the author
    ///
    /// Used when the bot cannot write to the channel. Platforms without
    /// private messages keep the default, which fails.
    fn send_private(&self, _message: &str) -> Result<(), SendError> {
        Err(SendError("private messages are not supported".to_string()))
    }
}

/// Send a message and log delivery failures instead of propagating them
pub(crate) fn send_logged(event: &dyn MessageEvent, message: &str) {
    if let Err(e) = event.send(message) {
        tracing::warn!("Could not reply in '{}': {}", event.channel_name(), e);
    }
}

/// Send a private message to the author and log delivery failures
pub(crate) fn send_private_logged(event: &dyn MessageEvent, message: &str) {
    if let Err(e) = event.send_private(message) {
        tracing::warn!("Could not message user {} privately: {}", event.author_id(), e);
    }
}

/// Mention forms that address the bot directly
///
/// Both the plain and the nickname mention are recognised.
pub fn mention_prefixes(self_id: u64) -> [String; 2] {
    [format!("<@{}> ", self_id), format!("<@!{}> ", self_id)]
}
