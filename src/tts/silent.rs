use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::{
    errors::{constants::SILENT_MILLIS_PER_WORD, Result},
    tts::{backend::SpeechBackend, job::SpeechJob},
};

/// Backend for headless runs: logs each utterance and holds the queue for
/// roughly as long as speaking it would take.
#[derive(Debug, Clone)]
pub struct SilentSpeech {
    per_word: Duration,
}

impl SilentSpeech {
    pub fn new(per_word: Duration) -> Self {
        Self { per_word }
    }

    pub fn duration_for(&self, job: &SpeechJob) -> Duration {
        let words = job.text.split_whitespace().count() as u32;
        self.per_word * words
    }
}

impl Default for SilentSpeech {
    fn default() -> Self {
        Self::new(Duration::from_millis(SILENT_MILLIS_PER_WORD))
    }
}

#[async_trait]
impl SpeechBackend for SilentSpeech {
    async fn speak(&self, job: &SpeechJob) -> Result<()> {
        info!(voice = %job.voice, volume = job.volume, "Speaking: {}", job.text);
        tokio::time::sleep(self.duration_for(job)).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_scales_with_words() {
        let backend = SilentSpeech::new(Duration::from_millis(100));
        let job = SpeechJob {
            text: String::from("bob said hello  world"),
            voice: String::from("Alice"),
            volume: 50,
            rate: 1.0,
        };

        assert_eq!(backend.duration_for(&job), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_speak_completes() {
        let backend = SilentSpeech::new(Duration::from_millis(1));
        let job = SpeechJob {
            text: String::from("hi"),
            voice: String::from("Alice"),
            volume: 50,
            rate: 1.0,
        };

        assert!(backend.speak(&job).await.is_ok());
    }
}
