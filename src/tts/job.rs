use std::sync::Arc;

use tracing::Instrument;

use crate::{
    database::settings::ConfigSnapshot,
    errors::constants::DEFAULT_SPEAKING_RATE,
    tts::{backend::SpeechBackend, queue::CompletionSignal, queue::Job},
};

/// One utterance waiting for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechJob {
    pub text: String,
    pub voice: String,
    pub volume: u8,
    pub rate: f32,
}

impl SpeechJob {
    /// Build the utterance for a chat message using the current settings.
    ///
    /// Example:
    /// ```rust,ignore
    /// let job = SpeechJob::for_chat("bob", "hello world", &snapshot);
    /// assert_eq!(job.text, "bob said hello world");
    /// ```
    pub fn for_chat(username: &str, message: &str, settings: &ConfigSnapshot) -> Self {
        Self {
            text: format!("{} said {}", username, message),
            voice: settings.voice.clone(),
            volume: settings.volume,
            rate: DEFAULT_SPEAKING_RATE,
        }
    }

    /// Wrap this utterance into a queue job that plays it on `backend`.
    ///
    /// The job signals completion once the backend reports that playback
    /// finished, or fails the signal with the backend's error. If the queue
    /// releases the job early, playback is cancelled.
    pub fn into_job(self, backend: Arc<dyn SpeechBackend>) -> impl Job {
        move |done: CompletionSignal| {
            let span = tracing::info_span!("speak", backend = backend.name(), voice = %self.voice);
            let job_task = done.job_task();
            let task = tokio::spawn(
                async move {
                    match backend.speak(&self).await {
                        Ok(()) => done.done(),
                        Err(e) => done.fail(e.to_string()),
                    }
                }
                .instrument(span),
            );
            job_task.attach(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_chat_uses_snapshot() {
        let snapshot = ConfigSnapshot {
            enabled: true,
            voice: String::from("Alice"),
            volume: 80,
        };

        let job = SpeechJob::for_chat("bob", "hello world", &snapshot);

        assert_eq!(job.text, "bob said hello world");
        assert_eq!(job.voice, "Alice");
        assert_eq!(job.volume, 80);
        assert_eq!(job.rate, 1.0);
    }
}
