use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use serde::Deserialize;

use crate::{
    database::StoreType,
    errors::{
        constants::{
            CONFIG_STORE_FILE, DEFAULT_CONFIG_PATH, DEFAULT_DATA_DIR, ENV_CHANNEL, ENV_CONFIG,
            ENV_REDIS_URL, ENV_TOKEN, ENV_USERNAME,
        },
        validation::validate_channel_name,
        RelayError, Result,
    },
    gateway::{normalize_channel, twitch::Credentials},
    tts::tts_type::TTSType,
};

/// Reads Twitch chat aloud.
///
/// Positional arguments take precedence over the matching environment
/// variables, which take precedence over the config file.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Bot account username
    #[arg(env = ENV_USERNAME)]
    pub username: Option<String>,

    /// OAuth token for the bot account
    #[arg(env = ENV_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Channel to join
    #[arg(env = ENV_CHANNEL)]
    pub channel: Option<String>,

    /// Path to a TOML config file
    #[arg(long, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Where settings are persisted
    #[arg(long, value_enum)]
    pub store: Option<StoreType>,

    /// Directory for the settings file
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Redis URL, required with `--store redis`
    #[arg(long, env = ENV_REDIS_URL)]
    pub redis_url: Option<String>,

    /// Speech backend
    #[arg(long, value_enum)]
    pub backend: Option<TTSType>,

    /// Release the speech queue if a job runs longer than this many seconds
    #[arg(long)]
    pub job_timeout_secs: Option<u64>,

    /// Log filter, e.g. `info` or `twitch_tts=debug`
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Contents of the optional TOML config file.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub username: Option<String>,
    pub token: Option<String>,
    pub channel: Option<String>,
    pub store: Option<StoreType>,
    pub data_dir: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub backend: Option<TTSType>,
    pub job_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Read the file at `path`. A missing file is only an error when
    /// `required` is set.
    pub fn read(path: &Path, required: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(e) => Err(RelayError::config(format!(
                "Cannot read config file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Fully resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub store: StoreType,
    pub data_dir: PathBuf,
    pub redis_url: Option<String>,
    pub backend: TTSType,
    pub job_timeout: Option<Duration>,
    pub log_level: String,
}

impl Config {
    /// Load the config file named by the CLI (or the default one if present)
    /// and merge it under the CLI values.
    pub fn load(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::read(path, true)?,
            None => FileConfig::read(Path::new(DEFAULT_CONFIG_PATH), false)?,
        };

        Self::resolve(cli, file)
    }

    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self> {
        let username = required(cli.username.or(file.username))
            .ok_or_else(|| RelayError::missing_startup_value("the bot's username"))?;
        let token = required(cli.token.or(file.token))
            .ok_or_else(|| RelayError::missing_startup_value("an oauth token for the bot"))?;
        let channel = required(cli.channel.or(file.channel)).ok_or_else(|| {
            RelayError::missing_startup_value("the twitch channel the bot should connect to")
        })?;

        validate_channel_name(&channel)?;

        let store = cli.store.or(file.store).unwrap_or_default();
        let redis_url = required(cli.redis_url.or(file.redis_url));
        if store == StoreType::Redis && redis_url.is_none() {
            return Err(RelayError::config(
                "A redis URL is required when the redis store is selected",
            ));
        }

        Ok(Self {
            credentials: Credentials {
                username,
                token,
                channel: normalize_channel(&channel),
            },
            store,
            data_dir: cli
                .data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            redis_url,
            backend: cli.backend.or(file.backend).unwrap_or_default(),
            job_timeout: cli
                .job_timeout_secs
                .or(file.job_timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            log_level: cli
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| String::from("info")),
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_STORE_FILE)
    }
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
