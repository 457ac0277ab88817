use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    commands::{
        tts::tts_command, voice::voice_command, volume::volume_command, Command,
    },
    data::BotData,
    errors::Result,
    events,
    gateway::{ChatMessage, ChatSender},
};

/// Routes chat messages to commands or to the speech queue.
pub struct Handler {
    data: BotData,
    chat: Arc<dyn ChatSender>,
}

impl Handler {
    pub fn new(data: BotData, chat: Arc<dyn ChatSender>) -> Self {
        Self { data, chat }
    }

    pub fn data(&self) -> &BotData {
        &self.data
    }

    /// Handle one inbound message, logging instead of propagating failures.
    pub async fn message(&self, message: ChatMessage) {
        if let Err(e) = self.dispatch(&message).await {
            error!(user = %message.sender.username, error = %e, "Failed to handle message");
        }
    }

    pub async fn ready(&self, username: &str) {
        if let Err(e) = events::ready::ready(&self.data, username).await {
            error!(error = %e, "Failed to finish startup");
        }
    }

    pub async fn dispatch(&self, message: &ChatMessage) -> Result<()> {
        let Some(command) = Command::parse(&message.text) else {
            return events::message_receive::message(&self.data, message).await;
        };

        if !command.is_permitted(&self.data, &message.sender) {
            debug!(user = %message.sender.username, ?command, "Ignoring command");
            return Ok(());
        }

        let chat = self.chat.as_ref();
        match &command {
            Command::Tts => tts_command(&self.data, chat, message).await,
            Command::Voice(args) => voice_command(&self.data, chat, message, args).await,
            Command::Volume(args) => volume_command(&self.data, chat, message, args).await,
            Command::Unknown(_) => Ok(()),
        }
    }
}
