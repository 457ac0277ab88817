use tracing::info;

use super::reply;
use crate::{
    data::BotData,
    errors::Result,
    gateway::{ChatMessage, ChatSender},
};

/// `!voice [name]`: change the speech voice. No name restores the default.
#[tracing::instrument(skip_all, fields(user = %message.sender.username))]
pub async fn voice_command(
    data: &BotData,
    chat: &dyn ChatSender,
    message: &ChatMessage,
    args: &[String],
) -> Result<()> {
    let requested = args.join(" ");
    let requested = Some(requested.as_str()).filter(|voice| !voice.is_empty());

    let (old, new) = data.settings.set_voice(requested).await?;
    info!("Voice changed from \"{}\" to \"{}\"", old, new);

    reply(
        chat,
        &message.channel,
        &format!("Voice changed from \"{}\" to \"{}\"", old, new),
    )
    .await
}
