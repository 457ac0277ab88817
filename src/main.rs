use std::{
    io::{IsTerminal, Write},
    process::ExitCode,
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use twitch_tts::{
    config::{Cli, Config},
    data::BotData,
    database::{open_store, settings::Settings},
    event_handler::Handler,
    gateway::twitch::TwitchGateway,
    trace::init_tracing_subscriber,
    tts::create_backend,
    SequentialJobQueue,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::load(Cli::parse());

    let log_level = config
        .as_ref()
        .map(|config| config.log_level.clone())
        .unwrap_or_else(|_| String::from("info"));
    init_tracing_subscriber(&log_level);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    set_terminal_title(&format!(
        "TwitchTTS | Channel: {}",
        config.credentials.channel
    ));

    // Load settings
    let store = open_store(&config)
        .await
        .context("Cannot open the settings store")?;
    let settings = Settings::new(store);
    settings.ensure_defaults().await?;

    let snapshot = settings.snapshot().await?;
    info!("TTS enabled: {}", snapshot.enabled);
    info!("TTS voice: {}", snapshot.voice);
    info!("TTS volume: {}", snapshot.volume);

    // Create speech queue
    let backend = create_backend(config.backend);
    let queue = match config.job_timeout {
        Some(timeout) => SequentialJobQueue::with_job_timeout(timeout),
        None => SequentialJobQueue::new(),
    };

    // Connect to twitch
    info!("Authenticating as: {}", config.credentials.username);
    info!("Logging into channel: {}", config.credentials.channel);
    let (client, mut events) = TwitchGateway::connect(&config.credentials)
        .await
        .context("Could not connect to twitch gateway")?;
    info!("Connected to twitch gateway");

    let data = BotData::new(settings, queue, backend, config.credentials.channel.clone());
    let handler = Handler::new(data, Arc::new(client));
    handler.ready(&config.credentials.username).await;

    loop {
        tokio::select! {
            message = events.recv() => match message {
                Some(message) => handler.message(message).await,
                None => anyhow::bail!("Disconnected from twitch gateway"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

fn set_terminal_title(title: &str) {
    let mut stdout = std::io::stdout();
    if stdout.is_terminal() {
        let _ = write!(stdout, "\x1b]0;{}\x07", title);
        let _ = stdout.flush();
    }
}
