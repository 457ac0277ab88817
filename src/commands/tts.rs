use tracing::info;

use super::reply;
use crate::{data::BotData, errors::Result, gateway::{ChatMessage, ChatSender}};

/// `!tts`: turn speech output on or off.
#[tracing::instrument(skip_all, fields(user = %message.sender.username))]
pub async fn tts_command(
    data: &BotData,
    chat: &dyn ChatSender,
    message: &ChatMessage,
) -> Result<()> {
    let enabled = data.settings.toggle_enabled().await?;

    if enabled {
        info!("TTS has been enabled");
        reply(chat, &message.channel, "TTS has been turned on").await
    } else {
        info!("TTS has been disabled");
        reply(chat, &message.channel, "TTS has been turned off").await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        database::{settings::Settings, store::MemoryStore},
        gateway::{MessageSender, MockChatSender},
        tts::{queue::SequentialJobQueue, silent::SilentSpeech},
    };

    #[tokio::test]
    async fn test_toggle_replies_with_new_state() {
        let data = BotData::new(
            Settings::new(Arc::new(MemoryStore::new())),
            SequentialJobQueue::new(),
            Arc::new(SilentSpeech::default()),
            "streamer",
        );
        let message = ChatMessage {
            channel: String::from("streamer"),
            sender: MessageSender::new("streamer"),
            text: String::from("!tts"),
        };

        let mut chat = MockChatSender::new();
        let mut sequence = mockall::Sequence::new();
        chat.expect_say()
            .withf(|channel, text| channel == "streamer" && text == "! TTS has been turned on")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));
        chat.expect_say()
            .withf(|_, text| text == "! TTS has been turned off")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));

        tts_command(&data, &chat, &message).await.unwrap();
        assert!(data.settings.enabled().await.unwrap());

        tts_command(&data, &chat, &message).await.unwrap();
        assert!(!data.settings.enabled().await.unwrap());
    }
}
