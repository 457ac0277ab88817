use tracing::{debug, info};

use crate::{data::BotData, errors::Result, gateway::ChatMessage, tts::job::SpeechJob};

/// Ordinary chat: log it and, when speech is on, queue it for reading.
///
/// Returns as soon as the job is queued; playback happens on the queue worker.
pub async fn message(data: &BotData, message: &ChatMessage) -> Result<()> {
    info!("{}: {}", message.sender.username, message.text);

    let settings = data.settings.snapshot().await?;
    if !settings.enabled {
        return Ok(());
    }

    let job = SpeechJob::for_chat(&message.sender.username, &message.text, &settings);
    debug!(voice = %job.voice, volume = job.volume, "Queueing speech");

    data.queue.enqueue(job.into_job(data.backend.clone()))
}
