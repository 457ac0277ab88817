use tracing::{debug, info};

use super::reply;
use crate::{
    data::BotData,
    errors::{validation::parse_volume, Result},
    gateway::{ChatMessage, ChatSender},
};

/// `!volume <0-100>`: change the speech volume.
///
/// Invalid input gets a corrective reply and leaves the stored volume alone.
#[tracing::instrument(skip_all, fields(user = %message.sender.username))]
pub async fn volume_command(
    data: &BotData,
    chat: &dyn ChatSender,
    message: &ChatMessage,
    args: &[String],
) -> Result<()> {
    let volume = match parse_volume(&args.join(" ")) {
        Ok(volume) => volume,
        Err(e) => {
            debug!(error = %e, "Rejected volume");
            return reply(chat, &message.channel, "Please enter a valid volume level").await;
        }
    };

    data.settings.set_volume(volume).await?;
    info!("Volume set to {}%", volume);

    reply(
        chat,
        &message.channel,
        &format!("Volume changed to {}%", volume),
    )
    .await
}
