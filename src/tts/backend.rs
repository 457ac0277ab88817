use async_trait::async_trait;

use crate::{errors::Result, tts::job::SpeechJob};

/// Speech output engine.
///
/// `speak` resolves once the utterance has finished playing. The queue turns
/// that into the job's completion signal, so a backend must not return
/// before audio output is done.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Play one utterance to completion.
    ///
    /// Example:
    /// ```rust,ignore
    /// backend.speak(&job).await?;
    /// ```
    async fn speak(&self, job: &SpeechJob) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
