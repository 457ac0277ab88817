pub mod backend;
pub mod job;
pub mod queue;
pub mod silent;
pub mod system;
pub mod tts_type;

use std::sync::Arc;

use backend::SpeechBackend;
use silent::SilentSpeech;
use system::SystemSpeech;
use tts_type::TTSType;

/// Create the speech backend selected in the configuration.
pub fn create_backend(tts_type: TTSType) -> Arc<dyn SpeechBackend> {
    match tts_type {
        TTSType::System => Arc::new(SystemSpeech::default()),
        TTSType::Silent => Arc::new(SilentSpeech::default()),
    }
}
