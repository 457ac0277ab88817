// Public API for the twitch-tts library

pub mod commands;
pub mod config;
pub mod data;
pub mod database;
pub mod errors;
pub mod event_handler;
pub mod events;
pub mod gateway;
pub mod trace;
pub mod tts;

// Re-export commonly used types
pub use errors::{RelayError, Result};
pub use tts::queue::{CompletionSignal, Job, JobTask, SequentialJobQueue};
pub use tts::tts_type::TTSType;
