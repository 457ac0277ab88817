/// Custom error types for the twitch-tts relay
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chat gateway error: {0}")]
    Gateway(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Speech backend error: {0}")]
    Speech(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid volume level: {0:?}")]
    InvalidVolume(String),

    #[error("Job queue is shut down")]
    QueueClosed,
}

impl RelayError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn speech(message: impl Into<String>) -> Self {
        Self::Speech(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn missing_startup_value(what: &str) -> Self {
        Self::Config(format!(
            "Make sure to provide {}. Example: {}",
            what,
            constants::USAGE_EXAMPLE
        ))
    }
}

impl From<tokio_util::codec::LinesCodecError> for RelayError {
    fn from(e: tokio_util::codec::LinesCodecError) -> Self {
        Self::Gateway(e.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RelayError>;

/// Input validation functions
pub mod validation {
    use super::*;
    use once_cell::sync::Lazy;
    use regex::Regex;

    static VOLUME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,3}$").unwrap());

    /// Parse a chat-supplied volume level.
    ///
    /// Accepts one to three ASCII digits (surrounding whitespace is ignored)
    /// with a value between 0 and 100 inclusive. Signs, decimals, exponents
    /// and internal whitespace are rejected.
    pub fn parse_volume(input: &str) -> Result<u8> {
        let trimmed = input.trim();

        if !VOLUME_PATTERN.is_match(trimmed) {
            return Err(RelayError::InvalidVolume(input.to_string()));
        }

        match trimmed.parse::<u8>() {
            Ok(volume) if volume <= constants::MAX_VOLUME => Ok(volume),
            _ => Err(RelayError::InvalidVolume(input.to_string())),
        }
    }

    /// Validate the channel name a bot joins.
    pub fn validate_channel_name(name: &str) -> Result<()> {
        let name = name.trim_start_matches('#');

        if name.trim().is_empty() {
            return Err(RelayError::invalid_input("Channel name cannot be empty"));
        }

        if name.len() > constants::MAX_USERNAME_LENGTH {
            return Err(RelayError::invalid_input(format!(
                "Channel name too long (max {} characters)",
                constants::MAX_USERNAME_LENGTH
            )));
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RelayError::invalid_input(
                "Channel name contains invalid characters (only letters, digits and underscores allowed)",
            ));
        }

        Ok(())
    }
}

/// Constants used throughout the application
pub mod constants {
    // Configuration constants
    pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
    pub const DEFAULT_DATA_DIR: &str = "data";
    pub const CONFIG_STORE_FILE: &str = "config.json";
    pub const USAGE_EXAMPLE: &str = "twitch-tts <username> <token> <channel>";

    // Environment variables
    pub const ENV_USERNAME: &str = "TTS_USERNAME";
    pub const ENV_TOKEN: &str = "TTS_TOKEN";
    pub const ENV_CHANNEL: &str = "TTS_CHANNEL";
    pub const ENV_REDIS_URL: &str = "TTS_REDIS_URL";
    pub const ENV_CONFIG: &str = "TTS_CONFIG";

    // Setting keys
    pub const KEY_ENABLED: &str = "enabled";
    pub const KEY_VOICE: &str = "voice";
    pub const KEY_VOLUME: &str = "volume";

    // Setting defaults
    pub const DEFAULT_ENABLED: bool = false;
    pub const DEFAULT_VOICE: &str = "Microsoft Richard";
    pub const DEFAULT_VOLUME: u8 = 100;
    pub const MAX_VOLUME: u8 = 100;

    // Speech constants
    pub const DEFAULT_SPEAKING_RATE: f32 = 1.0;
    pub const BASE_WORDS_PER_MINUTE: f32 = 175.0;
    pub const SILENT_MILLIS_PER_WORD: u64 = 300;

    // Chat constants
    pub const COMMAND_SIGIL: char = '!';
    pub const REPLY_PREFIX: &str = "! ";
    pub const MAX_USERNAME_LENGTH: usize = 25;

    // Twitch IRC constants
    pub const TWITCH_IRC_ADDR: &str = "irc.chat.twitch.tv:6667";
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const EVENT_CHANNEL_CAPACITY: usize = 256;
    /// Tags plus a 500 character message stay well below this.
    pub const MAX_IRC_LINE_LENGTH: usize = 8192;

    // Redis constants
    pub const REDIS_KEY_PREFIX: &str = "twitch_tts:";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_creation() {
        let config_error = RelayError::config("Test config error");
        assert!(matches!(config_error, RelayError::Config(_)));
        assert_eq!(
            config_error.to_string(),
            "Configuration error: Test config error"
        );

        let gateway_error = RelayError::gateway("connection reset");
        assert_eq!(
            gateway_error.to_string(),
            "Chat gateway error: connection reset"
        );
    }

    #[test]
    fn test_missing_startup_value_mentions_usage() {
        let error = RelayError::missing_startup_value("the bot's username");
        let message = error.to_string();
        assert!(message.contains("the bot's username"));
        assert!(message.contains(constants::USAGE_EXAMPLE));
    }

    mod validation_tests {
        use super::super::validation::*;
        use super::super::RelayError;

        #[test]
        fn test_parse_volume_valid() {
            assert_eq!(parse_volume("50").unwrap(), 50);
            assert_eq!(parse_volume("0").unwrap(), 0);
            assert_eq!(parse_volume("100").unwrap(), 100);
            assert_eq!(parse_volume(" 75 ").unwrap(), 75);
            assert_eq!(parse_volume("007").unwrap(), 7);
        }

        #[test]
        fn test_parse_volume_out_of_range() {
            assert!(parse_volume("101").is_err());
            assert!(parse_volume("255").is_err());
            assert!(parse_volume("999").is_err());
            assert!(parse_volume("1000").is_err());
        }

        #[test]
        fn test_parse_volume_rejects_loose_numbers() {
            for input in ["", "   ", "-1", "+5", "abc", "5.0", "1e2", "0x10", "5 0", "½"] {
                assert!(
                    matches!(parse_volume(input), Err(RelayError::InvalidVolume(_))),
                    "{:?} should be rejected",
                    input
                );
            }
        }

        #[test]
        fn test_validate_channel_name() {
            assert!(validate_channel_name("some_streamer").is_ok());
            assert!(validate_channel_name("#some_streamer").is_ok());
            assert!(validate_channel_name("").is_err());
            assert!(validate_channel_name("#").is_err());
            assert!(validate_channel_name("bad name").is_err());
            assert!(validate_channel_name(&"a".repeat(26)).is_err());
        }
    }
}
