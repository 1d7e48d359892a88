//! In-memory event source used by the command tests

use parking_lot::Mutex;

use super::event::MessageEvent;
use crate::error::SendError;
use crate::permissions::Permissions;

pub(crate) const BOT_ID: u64 = 1000;
pub(crate) const AUTHOR_ID: u64 = 7;

/// A message event that records everything sent back
pub(crate) struct TestEvent {
    pub content: String,
    pub author: u64,
    pub permissions: Option<Permissions>,
    pub sent: Mutex<Vec<String>>,
    pub private: Mutex<Vec<String>>,
}

impl TestEvent {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            author: AUTHOR_ID,
            permissions: None,
            sent: Mutex::new(Vec::new()),
            private: Mutex::new(Vec::new()),
        }
    }

    pub fn from_author(mut self, author: u64) -> Self {
        self.author = author;
        self
    }

    pub fn in_guild(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Private messages sent to the author
    pub fn private(&self) -> Vec<String> {
        self.private.lock().clone()
    }
}

impl MessageEvent for TestEvent {
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
        "general"
    }

    fn guild_name(&self) -> Option<&str> {
        self.permissions.map(|_| "Test Guild")
    }

    fn send(&self, message: &str) -> Result<(), SendError> {
        self.sent.lock().push(message.to_string());
        Ok(())
    }

    fn send_private(&self, message: &str) -> Result<(), SendError> {
        self.private.lock().push(message.to_string());
        Ok(())
    }
}
