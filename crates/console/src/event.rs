//! Console message events

use std::io::Write;

use chatroute_core::{MessageEvent, Permissions, SendError};

/// Id the console bot answers mentions for
pub const BOT_ID: u64 = 1000;

/// Author of lines without an explicit `[id]` marker
pub const DEFAULT_AUTHOR: u64 = 1;

/// A line typed on stdin, treated as a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEvent {
    content: String,
    author: u64,
    permissions: Option<Permissions>,
}

impl ConsoleEvent {
    /// Parse a line, optionally prefixed with `[author id] `
    pub fn parse(line: &str) -> Self {
        let (author, content) = line
            .strip_prefix('[')
            .and_then(|rest| rest.split_once("] "))
            .and_then(|(id, content)| id.parse().ok().map(|id| (id, content)))
            .unwrap_or((DEFAULT_AUTHOR, line));

        Self {
            content: content.to_string(),
            author,
            permissions: None,
        }
    }

    /// Pretend the message was sent in a guild where the bot has `permissions`
    #[cfg(test)]
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

impl MessageEvent for ConsoleEvent {
    fn content(&self) -> &str {
        &self.content
    }

    fn author_id(&self) -> u64 {
        self.author
    }

    fn self_id(&self) -> u64 {
        BOT_ID
    }

    fn bot_permissions(&self) -> Option<Permissions> {
        self.permissions
    }

    fn channel_name(&self) -> &str {
        "console"
    }

    fn guild_name(&self) -> Option<&str> {
        self.permissions.map(|_| "Console Guild")
    }

    fn send(&self, message: &str) -> Result<(), SendError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "bot> {}", message).map_err(|e| SendError(e.to_string()))
    }

    fn send_private(&self, message: &str) -> Result<(), SendError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "bot (to {})> {}", self.author, message).map_err(|e| SendError(e.to_string()))
    }
}
