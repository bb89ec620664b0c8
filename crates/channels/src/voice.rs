//! Voice front-end backends.
//!
//! Speech recognition and synthesis are delegated to external commands
//! configured as argv templates. Which of them exist is resolved once at
//! startup into a [`VoiceCapabilities`] value that the front-end consults;
//! nothing else probes the system.

use async_trait::async_trait;
use parley_config::VoiceConfig;
use parley_core::error::VoiceError;
use parley_core::voice::{SpeechToText, TextToSpeech};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Extra time granted to the listen command beyond timeout + phrase limit.
const LISTEN_GRACE: Duration = Duration::from_secs(5);

/// Pause after speaking so playback finishes before the microphone reopens.
const SPEAK_SETTLE: Duration = Duration::from_millis(500);

/// Which voice backends are usable on this machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCapabilities {
    /// Resolved listen argv template, if its program exists.
    pub listen: Option<Vec<String>>,
    /// Resolved speak argv template, if its program exists.
    pub speak: Option<Vec<String>>,
}

impl VoiceCapabilities {
    /// Probe `PATH` for the configured listen and speak programs.
    pub fn detect(config: &VoiceConfig) -> Self {
        let listen = config.listen_command.clone().filter(|argv| program_exists(argv));
        let speak = Some(config.effective_speak_command()).filter(|argv| program_exists(argv));

        match &listen {
            Some(argv) => info!(program = %argv[0], "Speech recognition available"),
            None => warn!("Speech recognition not available; set voice.listen_command to enable voice mode"),
        }
        match &speak {
            Some(argv) => info!(program = %argv[0], "Speech synthesis available"),
            None => info!("No speech synthesis program found; replies will be printed"),
        }

        Self { listen, speak }
    }

    /// Nothing available: text mode only.
    pub fn none() -> Self {
        Self::default()
    }

    /// Voice mode needs a recognizer; speech output can fall back to print.
    pub fn voice_mode_available(&self) -> bool {
        self.listen.is_some()
    }

    pub fn speech_output_available(&self) -> bool {
        self.speak.is_some()
    }

    pub fn speech_to_text(&self, config: &VoiceConfig) -> Option<Arc<dyn SpeechToText>> {
        let argv = self.listen.clone()?;
        Some(Arc::new(CommandSpeechToText::new(
            argv,
            config.pause_threshold_secs,
        )))
    }

    /// The detected speaker, or a [`PrintSpeaker`] when none was found.
    pub fn text_to_speech(&self, config: &VoiceConfig, name: &str) -> Arc<dyn TextToSpeech> {
        match &self.speak {
            Some(argv) => Arc::new(CommandTextToSpeech::new(
                argv.clone(),
                config.rate,
                config.volume,
            )),
            None => Arc::new(PrintSpeaker::new(name)),
        }
    }
}

fn program_exists(argv: &[String]) -> bool {
    argv.first()
        .is_some_and(|program| which::which(program).is_ok())
}

/// Substitute `{key}` placeholders in every argument.
fn render(template: &[String], vars: &[(&str, String)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
        })
        .collect()
}

fn command_for(argv: &[String]) -> Result<Command, String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| "empty command".to_string())?;
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
    Ok(cmd)
}

/// Speech recognition through an external command.
///
/// The command records one phrase and prints the transcription on stdout.
/// Template placeholders: `{timeout}`, `{phrase_limit}`, `{pause_threshold}`.
pub struct CommandSpeechToText {
    argv: Vec<String>,
    pause_threshold_secs: f32,
}

impl CommandSpeechToText {
    pub fn new(argv: Vec<String>, pause_threshold_secs: f32) -> Self {
        Self {
            argv,
            pause_threshold_secs,
        }
    }
}

#[async_trait]
impl SpeechToText for CommandSpeechToText {
    async fn listen(
        &self,
        timeout: Duration,
        phrase_limit: Duration,
    ) -> Result<Option<String>, VoiceError> {
        let argv = render(
            &self.argv,
            &[
                ("timeout", timeout.as_secs().to_string()),
                ("phrase_limit", phrase_limit.as_secs().to_string()),
                ("pause_threshold", self.pause_threshold_secs.to_string()),
            ],
        );
        let mut cmd = command_for(&argv).map_err(VoiceError::Service)?;
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| VoiceError::Service(format!("failed to start recognizer: {e}")))?;

        let budget = timeout + phrase_limit + LISTEN_GRACE;
        let output = match tokio::time::timeout(budget, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| VoiceError::Service(e.to_string()))?,
            Err(_) => {
                debug!(budget_secs = budget.as_secs(), "Listening timed out");
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            return Err(VoiceError::Service(format!(
                "recognizer exited with {code}: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }
        info!(text = %text, "Recognized speech");
        Ok(Some(text))
    }
}

/// Speech synthesis through an external command (`say`, `espeak`, ...).
///
/// Template placeholders: `{text}`, `{rate}`, `{volume}` (0.0-1.0) and
/// `{amplitude}` (volume scaled to espeak's 0-200).
pub struct CommandTextToSpeech {
    argv: Vec<String>,
    rate: u32,
    volume: f32,
    settle: Duration,
}

impl CommandTextToSpeech {
    pub fn new(argv: Vec<String>, rate: u32, volume: f32) -> Self {
        Self {
            argv,
            rate,
            volume,
            settle: SPEAK_SETTLE,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

#[async_trait]
impl TextToSpeech for CommandTextToSpeech {
    async fn speak(&self, text: &str) -> Result<(), VoiceError> {
        let amplitude = (self.volume.clamp(0.0, 1.0) * 200.0).round() as u32;
        let argv = render(
            &self.argv,
            &[
                ("rate", self.rate.to_string()),
                ("volume", self.volume.to_string()),
                ("amplitude", amplitude.to_string()),
                // Last, so placeholders inside the spoken text stay literal.
                ("text", text.to_string()),
            ],
        );
        let mut cmd = command_for(&argv).map_err(VoiceError::Playback)?;
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|e| VoiceError::Playback(format!("failed to start speaker: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Playback(stderr.trim().to_string()));
        }

        tokio::time::sleep(self.settle).await;
        Ok(())
    }
}

/// Prints replies instead of speaking them.
pub struct PrintSpeaker {
    name: String,
}

impl PrintSpeaker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl TextToSpeech for PrintSpeaker {
    async fn speak(&self, text: &str) -> Result<(), VoiceError> {
        println!("{}: {text}", self.name);
        Ok(())
    }
}
