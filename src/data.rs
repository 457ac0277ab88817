use std::sync::Arc;

use crate::{
    database::settings::Settings,
    gateway::MessageSender,
    tts::{backend::SpeechBackend, queue::SequentialJobQueue},
};

/// State shared by every message handler.
#[derive(Clone)]
pub struct BotData {
    pub settings: Settings,
    pub queue: SequentialJobQueue,
    pub backend: Arc<dyn SpeechBackend>,
    /// Channel the bot was started for, normalized. Its account is the owner.
    pub channel: String,
}

impl BotData {
    pub fn new(
        settings: Settings,
        queue: SequentialJobQueue,
        backend: Arc<dyn SpeechBackend>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            queue,
            backend,
            channel: channel.into(),
        }
    }

    pub fn is_owner(&self, sender: &MessageSender) -> bool {
        sender.username.eq_ignore_ascii_case(&self.channel)
    }

    pub fn is_moderator(&self, sender: &MessageSender) -> bool {
        sender.is_moderator
    }
}
