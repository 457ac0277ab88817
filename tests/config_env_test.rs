//! Startup value precedence: command line, then environment, then file.

use std::env;

use clap::Parser;
use serial_test::serial;
use tempfile::TempDir;

use twitch_tts::{
    config::{Cli, Config, FileConfig},
    errors::constants::{ENV_CHANNEL, ENV_CONFIG, ENV_REDIS_URL, ENV_TOKEN, ENV_USERNAME},
    RelayError,
};

fn clear_env() {
    for key in [ENV_USERNAME, ENV_TOKEN, ENV_CHANNEL, ENV_REDIS_URL, ENV_CONFIG] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_environment_fills_missing_arguments() {
    clear_env();
    env::set_var(ENV_USERNAME, "env_bot");
    env::set_var(ENV_TOKEN, "env_token");
    env::set_var(ENV_CHANNEL, "EnvChannel");

    let cli = Cli::try_parse_from(["twitch-tts"]).unwrap();
    let config = Config::resolve(cli, FileConfig::default()).unwrap();

    assert_eq!(config.credentials.username, "env_bot");
    assert_eq!(config.credentials.token, "env_token");
    assert_eq!(config.credentials.channel, "envchannel");

    clear_env();
}

#[test]
#[serial]
fn test_arguments_win_over_environment() {
    clear_env();
    env::set_var(ENV_USERNAME, "env_bot");
    env::set_var(ENV_TOKEN, "env_token");
    env::set_var(ENV_CHANNEL, "env_channel");

    let cli = Cli::try_parse_from(["twitch-tts", "cli_bot", "cli_token", "cli_channel"]).unwrap();
    let config = Config::resolve(cli, FileConfig::default()).unwrap();

    assert_eq!(config.credentials.username, "cli_bot");
    assert_eq!(config.credentials.token, "cli_token");
    assert_eq!(config.credentials.channel, "cli_channel");

    clear_env();
}

#[test]
#[serial]
fn test_environment_wins_over_file() {
    clear_env();
    env::set_var(ENV_CHANNEL, "env_channel");

    let file = FileConfig {
        username: Some(String::from("file_bot")),
        token: Some(String::from("file_token")),
        channel: Some(String::from("file_channel")),
        ..Default::default()
    };
    let cli = Cli::try_parse_from(["twitch-tts"]).unwrap();
    let config = Config::resolve(cli, file).unwrap();

    assert_eq!(config.credentials.username, "file_bot");
    assert_eq!(config.credentials.channel, "env_channel");

    clear_env();
}

#[test]
#[serial]
fn test_missing_channel_names_usage() {
    clear_env();

    let cli = Cli::try_parse_from(["twitch-tts", "bot", "token"]).unwrap();
    let err = Config::resolve(cli, FileConfig::default()).unwrap_err();

    assert!(matches!(err, RelayError::Config(_)));
    let message = err.to_string();
    assert!(message.contains("the twitch channel the bot should connect to"));
    assert!(message.contains("twitch-tts <username> <token> <channel>"));
}

#[test]
#[serial]
fn test_explicit_config_file_is_read() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("twitch-tts.toml");
    std::fs::write(
        &path,
        "username = \"file_bot\"\ntoken = \"file_token\"\nchannel = \"file_channel\"\nbackend = \"silent\"\njob_timeout_secs = 0\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from(["twitch-tts", "--config", path.to_str().unwrap()]).unwrap();
    let config = Config::load(cli).unwrap();

    assert_eq!(config.credentials.username, "file_bot");
    assert_eq!(config.job_timeout, None);
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();

    let cli = Cli {
        config: Some(dir.path().join("absent.toml")),
        ..Default::default()
    };

    assert!(matches!(Config::load(cli), Err(RelayError::Config(_))));
}
