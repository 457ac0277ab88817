pub mod irc;
pub mod twitch;

use async_trait::async_trait;

use crate::errors::Result;

/// Who sent a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSender {
    /// Lowercase login name.
    pub username: String,
    pub display_name: Option<String>,
    pub is_moderator: bool,
    pub is_broadcaster: bool,
}

impl MessageSender {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: None,
            is_moderator: false,
            is_broadcaster: false,
        }
    }

    pub fn moderator(mut self) -> Self {
        self.is_moderator = true;
        self
    }
}

/// An inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Channel name without the leading `#`.
    pub channel: String,
    pub sender: MessageSender,
    pub text: String,
}

/// Outbound half of a chat connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Post a message to `channel`.
    async fn say(&self, channel: &str, text: &str) -> Result<()>;
}

/// Strip the leading `#` and lowercase a channel name.
pub fn normalize_channel(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_lowercase()
}
