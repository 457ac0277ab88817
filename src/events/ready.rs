use tracing::info;

use crate::{data::BotData, errors::Result};

/// Called once the gateway has joined the channel.
#[tracing::instrument(skip_all)]
pub async fn ready(data: &BotData, username: &str) -> Result<()> {
    info!("{} is connected to #{}", username, data.channel);

    let state = data.queue.state();
    info!(
        pending = state.pending,
        backend = data.backend.name(),
        "Speech queue ready"
    );

    Ok(())
}
