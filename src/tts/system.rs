//! Local OS speech engine run as a child process.
//!
//! - macOS: `say`
//! - Linux: `espeak-ng`
//! - Windows: PowerShell with `System.Speech`
//!
//! One process is spawned per utterance and the utterance is complete when
//! the process exits. Text is never passed on the command line so chat
//! content cannot be read as an option.
//!
//! `say` and `espeak-ng` fail on a voice they do not know. The default voice
//! is a SAPI name, so it is left to the engine's own default there, and a
//! rejected custom voice is retried once with the engine default.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, info, warn};

use crate::{
    errors::{
        constants::{BASE_WORDS_PER_MINUTE, DEFAULT_VOICE},
        RelayError, Result,
    },
    tts::{backend::SpeechBackend, job::SpeechJob},
};

const POWERSHELL_SCRIPT: &str = r#"
Add-Type -AssemblyName System.Speech
$synth = New-Object System.Speech.Synthesis.SpeechSynthesizer
try { $synth.SelectVoice($env:TTS_VOICE) } catch { }
$synth.Volume = [int]$env:TTS_VOLUME
$synth.Rate = [int]$env:TTS_RATE
$synth.Speak([Console]::In.ReadToEnd())
"#;

/// Which speech program to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechProgram {
    Say,
    EspeakNg,
    PowerShell,
}

impl SpeechProgram {
    /// The program for the platform we were built for.
    pub fn for_current_platform() -> Self {
        if cfg!(target_os = "macos") {
            Self::Say
        } else if cfg!(target_os = "windows") {
            Self::PowerShell
        } else {
            Self::EspeakNg
        }
    }
}

/// Fully resolved child process invocation for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
    pub envs: Vec<(&'static str, String)>,
    pub stdin: String,
}

impl Invocation {
    /// Map a job's voice, volume and rate onto the program's options.
    pub fn build(program: SpeechProgram, job: &SpeechJob) -> Self {
        let volume = job.volume.min(100);
        let words_per_minute = (BASE_WORDS_PER_MINUTE * job.rate).round() as u32;

        let mut voice_args = Vec::new();
        if job.voice != DEFAULT_VOICE {
            voice_args.extend(["-v".to_string(), job.voice.clone()]);
        }

        match program {
            SpeechProgram::Say => Self {
                program: "say",
                args: voice_args
                    .into_iter()
                    .chain([
                        "-r".to_string(),
                        words_per_minute.to_string(),
                        "-f".to_string(),
                        "-".to_string(),
                    ])
                    .collect(),
                envs: Vec::new(),
                // `say` takes volume as an embedded command in the text.
                stdin: format!("[[volm {:.2}]] {}", volume as f32 / 100.0, job.text),
            },
            SpeechProgram::EspeakNg => Self {
                program: "espeak-ng",
                args: voice_args
                    .into_iter()
                    .chain([
                        "-a".to_string(),
                        volume.to_string(),
                        "-s".to_string(),
                        words_per_minute.to_string(),
                        "--stdin".to_string(),
                    ])
                    .collect(),
                envs: Vec::new(),
                stdin: job.text.clone(),
            },
            SpeechProgram::PowerShell => Self {
                program: "powershell.exe",
                args: vec![
                    "-NoProfile".to_string(),
                    "-NonInteractive".to_string(),
                    "-Command".to_string(),
                    POWERSHELL_SCRIPT.to_string(),
                ],
                envs: vec![
                    ("TTS_VOICE", job.voice.clone()),
                    ("TTS_VOLUME", volume.to_string()),
                    // SAPI rate is -10..10 with 0 as normal speed.
                    ("TTS_RATE", sapi_rate(job.rate).to_string()),
                ],
                stdin: job.text.clone(),
            },
        }
    }

    /// Whether the invocation names a voice on the command line.
    pub fn selects_voice(&self) -> bool {
        self.args.iter().any(|arg| arg == "-v")
    }

    async fn run(&self) -> Result<()> {
        debug!(args = ?self.args, "Spawning speech process");

        let mut child = Command::new(self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RelayError::speech(format!("Failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(self.stdin.as_bytes()).await?;
            // Closing stdin marks the end of the text.
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RelayError::speech(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn sapi_rate(rate: f32) -> i32 {
    (((rate - 1.0) * 10.0).round() as i32).clamp(-10, 10)
}

/// Speech through the operating system's own engine.
#[derive(Debug, Clone)]
pub struct SystemSpeech {
    program: SpeechProgram,
}

impl SystemSpeech {
    pub fn new(program: SpeechProgram) -> Self {
        info!(?program, "Using system speech backend");
        Self { program }
    }

    pub fn program(&self) -> SpeechProgram {
        self.program
    }
}

impl Default for SystemSpeech {
    fn default() -> Self {
        Self::new(SpeechProgram::for_current_platform())
    }
}

#[async_trait]
impl SpeechBackend for SystemSpeech {
    #[tracing::instrument(skip(self, job), fields(program = ?self.program))]
    async fn speak(&self, job: &SpeechJob) -> Result<()> {
        let invocation = Invocation::build(self.program, job);

        match invocation.run().await {
            Err(RelayError::Speech(reason)) if invocation.selects_voice() => {
                warn!(voice = %job.voice, reason = %reason, "Voice rejected, using the engine default");
                let fallback = SpeechJob {
                    voice: DEFAULT_VOICE.to_string(),
                    ..job.clone()
                };
                Invocation::build(self.program, &fallback).run().await
            }
            result => result,
        }
    }

    fn name(&self) -> &'static str {
        "system"
    }
}
