//! Twitch chat over plain IRC.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    sync::{mpsc, Mutex},
    time,
};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use super::{irc::IrcLine, normalize_channel, ChatMessage, ChatSender};
use crate::errors::{
    constants::{
        CONNECT_TIMEOUT_SECS, EVENT_CHANNEL_CAPACITY, MAX_IRC_LINE_LENGTH, TWITCH_IRC_ADDR,
    },
    RelayError, Result,
};

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Bot identity and the channel to join.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub token: String,
    pub channel: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("channel", &self.channel)
            .finish()
    }
}

impl Credentials {
    fn pass(&self) -> String {
        if self.token.starts_with("oauth:") {
            self.token.clone()
        } else {
            format!("oauth:{}", self.token)
        }
    }
}

/// Connected Twitch chat client. Cloning shares the connection.
#[derive(Clone)]
pub struct TwitchClient {
    writer: Arc<Mutex<Writer>>,
}

impl TwitchClient {
    async fn send_raw(&self, line: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(format!("{}\r\n", line).as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn login<R>(
        &self,
        lines: &mut FramedRead<R, LinesCodec>,
        credentials: &Credentials,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        self.send_raw(&format!("PASS {}", credentials.pass())).await?;
        self.send_raw(&format!("NICK {}", credentials.username.to_lowercase()))
            .await?;
        self.send_raw("CAP REQ :twitch.tv/tags twitch.tv/commands")
            .await?;

        while let Some(line) = lines.next().await {
            let line = line?;
            let Some(parsed) = IrcLine::parse(&line) else {
                continue;
            };

            match parsed.command.as_str() {
                "001" => {
                    self.send_raw(&format!("JOIN #{}", normalize_channel(&credentials.channel)))
                        .await?;
                    return Ok(());
                }
                "NOTICE" => {
                    let notice = parsed.params.last().cloned().unwrap_or_default();
                    return Err(RelayError::authentication(notice));
                }
                "PING" => {
                    let payload = parsed.params.last().map(String::as_str).unwrap_or("");
                    self.send_raw(&format!("PONG :{}", payload)).await?;
                }
                _ => debug!(line = %line, "Ignoring line during login"),
            }
        }

        Err(RelayError::gateway("Connection closed during login"))
    }
}

#[async_trait]
impl ChatSender for TwitchClient {
    async fn say(&self, channel: &str, text: &str) -> Result<()> {
        let text = text.replace(['\r', '\n'], " ");
        self.send_raw(&format!("PRIVMSG #{} :{}", normalize_channel(channel), text))
            .await
    }
}

/// Entry point for opening Twitch chat connections.
pub struct TwitchGateway;

impl TwitchGateway {
    /// Connect to Twitch, authenticate and join the channel.
    ///
    /// Returns the client for sending and a receiver of inbound chat
    /// messages. The receiver closes when the connection ends.
    #[tracing::instrument]
    pub async fn connect(
        credentials: &Credentials,
    ) -> Result<(TwitchClient, mpsc::Receiver<ChatMessage>)> {
        let timeout = Duration::from_secs(CONNECT_TIMEOUT_SECS);

        let stream = time::timeout(timeout, TcpStream::connect(TWITCH_IRC_ADDR))
            .await
            .map_err(|_| RelayError::gateway(format!("Timed out connecting to {}", TWITCH_IRC_ADDR)))?
            .map_err(|e| RelayError::gateway(format!("Cannot reach {}: {}", TWITCH_IRC_ADDR, e)))?;

        Self::connect_with(stream, credentials).await
    }

    /// Run the login handshake over an already open stream.
    pub async fn connect_with<S>(
        stream: S,
        credentials: &Credentials,
    ) -> Result<(TwitchClient, mpsc::Receiver<ChatMessage>)>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut lines = FramedRead::new(read_half, irc_codec());
        let writer: Writer = Box::new(write_half);
        let client = TwitchClient {
            writer: Arc::new(Mutex::new(writer)),
        };

        time::timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            client.login(&mut lines, credentials),
        )
        .await
        .map_err(|_| RelayError::gateway("Timed out waiting for Twitch to accept the login"))??;

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(read_loop(lines, client.clone(), events_tx));

        Ok((client, events_rx))
    }
}

fn irc_codec() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_IRC_LINE_LENGTH)
}

async fn read_loop<R>(
    mut lines: FramedRead<R, LinesCodec>,
    client: TwitchClient,
    events: mpsc::Sender<ChatMessage>,
) where
    R: AsyncRead + Unpin,
{
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                // The codec drops the rest of the line and resynchronizes.
                warn!(max = MAX_IRC_LINE_LENGTH, "Skipping oversized line from Twitch");
                continue;
            }
            Err(e) => {
                error!(error = %e, "Failed to read from Twitch");
                break;
            }
        };

        let Some(parsed) = IrcLine::parse(&line) else {
            continue;
        };

        match parsed.command.as_str() {
            "PING" => {
                let payload = parsed.params.last().map(String::as_str).unwrap_or("");
                if let Err(e) = client.send_raw(&format!("PONG :{}", payload)).await {
                    error!(error = %e, "Failed to answer PING");
                    break;
                }
            }
            "PRIVMSG" => {
                if let Some(message) = parsed.into_chat_message() {
                    if events.send(message).await.is_err() {
                        break;
                    }
                }
            }
            "RECONNECT" => {
                warn!("Twitch asked the bot to reconnect");
                break;
            }
            "NOTICE" => info!(notice = ?parsed.params.last(), "Twitch notice"),
            _ => debug!(line = %line, "Unhandled line"),
        }
    }

    info!("Twitch connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_irc_codec_rejects_oversized_lines() {
        let mut input = "a".repeat(MAX_IRC_LINE_LENGTH * 3).into_bytes();
        input.extend_from_slice(b"\r\nPING :tmi.twitch.tv\r\n");

        let mut lines = FramedRead::new(input.as_slice(), irc_codec());

        assert!(matches!(
            lines.next().await,
            Some(Err(LinesCodecError::MaxLineLengthExceeded))
        ));
        assert_eq!(
            lines.next().await.unwrap().unwrap(),
            "PING :tmi.twitch.tv"
        );
    }

    #[test]
    fn test_pass_adds_oauth_prefix() {
        let credentials = Credentials {
            username: String::from("bot"),
            token: String::from("abc"),
            channel: String::from("streamer"),
        };

        assert_eq!(credentials.pass(), "oauth:abc");
        assert!(!format!("{:?}", credentials).contains("abc"));
    }
}
