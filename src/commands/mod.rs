pub mod tts;
pub mod voice;
pub mod volume;

use crate::{
    data::BotData,
    errors::{
        constants::{COMMAND_SIGIL, REPLY_PREFIX},
        Result,
    },
    gateway::{ChatSender, MessageSender},
};

/// A chat command, recognized by the leading sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!tts`
    Tts,
    /// `!voice [name...]`
    Voice(Vec<String>),
    /// `!volume <level>`
    Volume(Vec<String>),
    Unknown(String),
}

impl Command {
    /// Parse a chat message. Returns `None` for ordinary chat.
    ///
    /// Example:
    /// ```rust
    /// use twitch_tts::commands::Command;
    ///
    /// assert_eq!(
    ///     Command::parse("!volume 50"),
    ///     Some(Command::Volume(vec![String::from("50")]))
    /// );
    /// assert_eq!(Command::parse("hello"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.strip_prefix(COMMAND_SIGIL)?;

        if body.starts_with(char::is_whitespace) {
            return Some(Self::Unknown(String::new()));
        }

        let mut tokens = body.split_whitespace();
        let name = tokens.next().unwrap_or_default().to_lowercase();
        let args: Vec<String> = tokens.map(str::to_string).collect();

        Some(match name.as_str() {
            "tts" => Self::Tts,
            "voice" => Self::Voice(args),
            "volume" => Self::Volume(args),
            _ => Self::Unknown(name),
        })
    }

    /// Whether `sender` may run this command. Unknown commands are never run.
    pub fn is_permitted(&self, data: &BotData, sender: &MessageSender) -> bool {
        match self {
            Self::Tts | Self::Voice(_) => data.is_owner(sender),
            Self::Volume(_) => data.is_owner(sender) || data.is_moderator(sender),
            Self::Unknown(_) => false,
        }
    }
}

/// Post a bot reply, marked with the reply prefix.
pub async fn reply(chat: &dyn ChatSender, channel: &str, text: &str) -> Result<()> {
    chat.say(channel, &format!("{}{}", REPLY_PREFIX, text)).await
}
