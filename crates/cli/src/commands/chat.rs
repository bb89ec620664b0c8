//! `parley chat`: interactive text/voice session or single-message mode.

use parley_assistant::{CapabilityRouter, CompletionClient, ConversationManager};
use parley_channels::{CliChannel, VoiceCapabilities};
use parley_config::{AppConfig, ConfigError};
use parley_core::channel::{Channel, ChannelMessage};
use parley_core::error::ChannelError;
use parley_core::voice::{SpeechToText, TextToSpeech};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const GOODBYE: &str = "Goodbye! Have a great day!";
const INTERRUPTED: &str = "Goodbye!";
const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";
const VOICE_UNAVAILABLE: &str =
    "Voice mode is not available. The voice interface failed to initialize.";

pub async fn run(
    config: Result<AppConfig, ConfigError>,
    message: Option<String>,
    voice: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config.map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for the API key early: give a clear error
    if let Err(e) = config.require_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY=sk-...     (OpenAI)");
        eprintln!("    PARLEY_API_KEY=...        (any configured provider)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(e.into());
    }

    let providers = parley_providers::router::build_from_config(&config);
    let provider = providers.default().ok_or("No default provider configured")?;
    let skills = parley_skills::default_table(&config);

    let mut manager = ConversationManager::new(
        CapabilityRouter::new(&skills),
        CompletionClient::from_config(provider, &config),
    )
    .with_history_limit(config.assistant.history_limit);

    if let Some(msg) = message {
        // Single message mode
        let reply = manager.process_input(msg.trim()).await?;
        println!("{reply}");
        return Ok(());
    }

    let capabilities = VoiceCapabilities::detect(&config.voice);
    let voice_io = VoiceIo::from_capabilities(&capabilities, &config);

    println!("Starting {}...", config.assistant.name);
    println!();
    println!("Available modes:");
    println!("  • Text mode: Always available");
    if voice_io.is_some() {
        println!("  • Voice mode: Available");
    } else {
        println!("  • Voice mode: Not available (set voice.listen_command in config.toml)");
    }

    info!(
        provider = %config.default_provider,
        model = %config.effective_model(),
        "Session started"
    );

    let mut session = Session::new(&config.assistant.name, manager, CliChannel::new(), voice_io);
    session.run_until(voice, ctrl_c()).await?;
    Ok(())
}

/// Resolves on the first Ctrl-C. Never resolves if the handler cannot be
/// installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Speech collaborators plus the timing they are driven with.
#[derive(Clone)]
struct VoiceIo {
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    /// Print replies before speaking them. Off when the speaker itself prints.
    print_replies: bool,
    timeout: Duration,
    phrase_limit: Duration,
}

impl VoiceIo {
    fn from_capabilities(capabilities: &VoiceCapabilities, config: &AppConfig) -> Option<Self> {
        let stt = capabilities.speech_to_text(&config.voice)?;
        Some(Self {
            stt,
            tts: capabilities.text_to_speech(&config.voice, &config.assistant.name),
            print_replies: capabilities.speech_output_available(),
            timeout: Duration::from_secs(config.voice.timeout_secs),
            phrase_limit: Duration::from_secs(config.voice.phrase_limit_secs),
        })
    }
}

/// What a typed line asks for.
#[derive(Debug, PartialEq)]
enum TextCommand<'a> {
    Exit,
    Voice,
    Utterance(&'a str),
}

impl<'a> TextCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let lowered = line.trim().to_lowercase();
        match lowered.as_str() {
            "quit" | "exit" | "bye" | "goodbye" => TextCommand::Exit,
            "voice" => TextCommand::Voice,
            _ => TextCommand::Utterance(line.trim()),
        }
    }
}

/// What a transcribed phrase asks for. Matched by substring.
#[derive(Debug, PartialEq)]
enum VoiceCommand {
    TextMode,
    Exit,
    Utterance,
}

impl VoiceCommand {
    fn parse(heard: &str) -> Self {
        let lowered = heard.to_lowercase();
        if ["stop listening", "text mode"].iter().any(|p| lowered.contains(p)) {
            VoiceCommand::TextMode
        } else if ["goodbye", "quit", "exit"].iter().any(|p| lowered.contains(p)) {
            VoiceCommand::Exit
        } else {
            VoiceCommand::Utterance
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Text,
    Voice,
}

type Inbox = mpsc::Receiver<Result<ChannelMessage, ChannelError>>;

/// One interactive session, switching between text and voice modes.
///
/// Per-turn failures become a generic apology and the loop continues. Only
/// exit commands, end of input, an interrupt or a broken terminal end it.
struct Session {
    name: String,
    manager: ConversationManager,
    channel: CliChannel,
    voice: Option<VoiceIo>,
}

impl Session {
    fn new(
        name: impl Into<String>,
        manager: ConversationManager,
        channel: CliChannel,
        voice: Option<VoiceIo>,
    ) -> Self {
        Self {
            name: name.into(),
            manager,
            channel,
            voice,
        }
    }

    /// Run the session until the user leaves or `interrupt` resolves. An
    /// interrupt abandons whatever is in flight: prompt, turn or speech.
    async fn run_until<F>(&mut self, start_in_voice: bool, interrupt: F) -> parley_core::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run(start_in_voice) => result,
            () = interrupt => {
                info!("Session interrupted");
                self.channel.send("").await?;
                self.say(INTERRUPTED).await?;
                Ok(())
            }
        }
    }

    async fn run(&mut self, start_in_voice: bool) -> parley_core::Result<()> {
        let mut inbox = self.channel.start().await?;

        let mut mode = Mode::Text;
        if start_in_voice {
            if self.voice.is_some() {
                mode = Mode::Voice;
            } else {
                self.say(VOICE_UNAVAILABLE).await?;
            }
        }

        loop {
            let next = match mode {
                Mode::Text => self.text_mode(&mut inbox).await?,
                Mode::Voice => self.voice_mode().await?,
            };
            match next {
                Some(m) => mode = m,
                None => return Ok(()),
            }
        }
    }

    async fn say(&self, text: &str) -> Result<(), ChannelError> {
        self.channel.send(&format!("{}: {text}", self.name)).await
    }

    async fn reply_to(&mut self, text: &str) -> String {
        match self.manager.process_input(text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error processing input: {e}");
                ERROR_REPLY.into()
            }
        }
    }

    /// Returns the next mode, or `None` when the session is over.
    async fn text_mode(&mut self, inbox: &mut Inbox) -> Result<Option<Mode>, ChannelError> {
        self.channel.send("").await?;
        self.channel.send(&format!("{} Text Interface", self.name)).await?;
        self.channel.send("Type 'quit', 'exit', or 'bye' to stop").await?;
        self.channel.send("Type 'voice' to switch to voice mode (if available)").await?;
        self.channel.send(&"-".repeat(50)).await?;

        loop {
            self.channel.prompt("You: ").await?;

            let Some(next) = inbox.recv().await else {
                // End of input
                self.channel.send("").await?;
                self.say(GOODBYE).await?;
                return Ok(None);
            };

            let line = match next {
                Ok(msg) => msg.content,
                Err(e) => {
                    error!("Error in text mode: {e}");
                    self.say(ERROR_REPLY).await?;
                    continue;
                }
            };

            match TextCommand::parse(&line) {
                TextCommand::Exit => {
                    self.say(GOODBYE).await?;
                    return Ok(None);
                }
                TextCommand::Voice if self.voice.is_some() => return Ok(Some(Mode::Voice)),
                TextCommand::Voice => self.say(VOICE_UNAVAILABLE).await?,
                TextCommand::Utterance(text) => {
                    let reply = self.reply_to(text).await;
                    self.say(&reply).await?;
                }
            }
        }
    }

    async fn voice_mode(&mut self) -> Result<Option<Mode>, ChannelError> {
        let Some(voice) = self.voice.clone() else {
            self.say(VOICE_UNAVAILABLE).await?;
            return Ok(Some(Mode::Text));
        };

        self.channel.send("").await?;
        self.channel.send(&format!("{} Voice Interface", self.name)).await?;
        self.channel.send("Say 'stop listening' or 'text mode' to switch back to text").await?;
        self.channel.send("Say 'goodbye' to quit").await?;
        self.channel.send(&"-".repeat(50)).await?;

        loop {
            self.channel
                .send(&format!(
                    "Listening... (you have {} seconds to start and {} seconds total)",
                    voice.timeout.as_secs(),
                    voice.phrase_limit.as_secs()
                ))
                .await?;

            let text = match voice.stt.listen(voice.timeout, voice.phrase_limit).await {
                Ok(Some(text)) => text,
                Ok(None) => {
                    self.channel.send("No speech detected. Please try again.").await?;
                    continue;
                }
                Err(e) => {
                    error!("Speech recognition error: {e}");
                    self.channel
                        .send("Sorry, there was an error with the speech recognition service")
                        .await?;
                    continue;
                }
            };

            self.channel.send(&format!("You said: {text}")).await?;

            match VoiceCommand::parse(&text) {
                VoiceCommand::TextMode => {
                    self.channel.send("Switching to text mode...").await?;
                    return Ok(Some(Mode::Text));
                }
                VoiceCommand::Exit => {
                    self.speak(&voice, GOODBYE).await?;
                    return Ok(None);
                }
                VoiceCommand::Utterance => {
                    let reply = self.reply_to(&text).await;
                    self.speak(&voice, &reply).await?;
                }
            }
        }
    }

    /// Speak a reply, printing it instead when speech output fails.
    async fn speak(&self, voice: &VoiceIo, text: &str) -> Result<(), ChannelError> {
        if voice.print_replies {
            self.say(text).await?;
        }
        if let Err(e) = voice.tts.speak(text).await {
            warn!("Speech output failed: {e}");
            if !voice.print_replies {
                self.say(text).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::error::{ProviderError, VoiceError};
    use parley_core::message::Message;
    use parley_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use parley_skills::joke::JOKES;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::sync::Notify;

    /// Replies "Hi!" to every completion request.
    struct FriendlyProvider;

    #[async_trait]
    impl Provider for FriendlyProvider {
        fn name(&self) -> &str {
            "friendly"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant("Hi!"),
                usage: None,
                model: "mock".into(),
            })
        }
    }

    /// Signals `started`, then never answers.
    struct HangingProvider {
        started: Arc<Notify>,
    }

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.started.notify_one();
            std::future::pending().await
        }
    }

    /// Plays back a fixed sequence of recognition results.
    struct ScriptedListener {
        script: Mutex<VecDeque<Result<Option<String>, VoiceError>>>,
    }

    impl ScriptedListener {
        fn new(script: Vec<Result<Option<&str>, VoiceError>>) -> Self {
            Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|r| r.map(|o| o.map(String::from)))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl SpeechToText for ScriptedListener {
        async fn listen(
            &self,
            _timeout: Duration,
            _phrase_limit: Duration,
        ) -> Result<Option<String>, VoiceError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedListener: script exhausted")
        }
    }

    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextToSpeech for RecordingSpeaker {
        async fn speak(&self, text: &str) -> Result<(), VoiceError> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct BrokenSpeaker;

    /// Signals `started`, then never finishes speaking.
    struct HangingSpeaker {
        started: Arc<Notify>,
    }

    #[async_trait]
    impl TextToSpeech for HangingSpeaker {
        async fn speak(&self, _text: &str) -> Result<(), VoiceError> {
            self.started.notify_one();
            std::future::pending().await
        }
    }

    #[async_trait]
    impl TextToSpeech for BrokenSpeaker {
        async fn speak(&self, _text: &str) -> Result<(), VoiceError> {
            Err(VoiceError::Playback("no audio device".into()))
        }
    }

    fn manager() -> ConversationManager {
        manager_with(Arc::new(FriendlyProvider))
    }

    fn manager_with(provider: Arc<dyn Provider>) -> ConversationManager {
        let skills = parley_skills::default_table(&AppConfig::default());
        ConversationManager::new(
            CapabilityRouter::new(&skills),
            CompletionClient::new(provider, "Assistant"),
        )
    }

    fn voice_io(
        listener: ScriptedListener,
        speaker: Arc<dyn TextToSpeech>,
        print_replies: bool,
    ) -> VoiceIo {
        VoiceIo {
            stt: Arc::new(listener),
            tts: speaker,
            print_replies,
            timeout: Duration::from_secs(15),
            phrase_limit: Duration::from_secs(15),
        }
    }

    fn session(input: &'static str, voice: Option<VoiceIo>) -> (Session, DuplexStream) {
        session_with(manager(), input, voice)
    }

    fn session_with(
        manager: ConversationManager,
        input: &'static str,
        voice: Option<VoiceIo>,
    ) -> (Session, DuplexStream) {
        let (out, peer) = tokio::io::duplex(1 << 16);
        let channel = CliChannel::with_io(input.as_bytes(), out);
        (Session::new("Assistant", manager, channel, voice), peer)
    }

    async fn transcript(session: Session, mut peer: DuplexStream) -> String {
        drop(session);
        let mut out = String::new();
        peer.read_to_string(&mut out).await.unwrap();
        out
    }

    #[test]
    fn text_commands() {
        assert_eq!(TextCommand::parse("quit"), TextCommand::Exit);
        assert_eq!(TextCommand::parse("  Goodbye "), TextCommand::Exit);
        assert_eq!(TextCommand::parse("BYE"), TextCommand::Exit);
        assert_eq!(TextCommand::parse("Voice"), TextCommand::Voice);
        assert_eq!(
            TextCommand::parse("voice mode please"),
            TextCommand::Utterance("voice mode please")
        );
        assert_eq!(
            TextCommand::parse("say goodbye to Bob"),
            TextCommand::Utterance("say goodbye to Bob")
        );
    }

    #[test]
    fn voice_commands() {
        assert_eq!(VoiceCommand::parse("please stop listening"), VoiceCommand::TextMode);
        assert_eq!(VoiceCommand::parse("Text Mode"), VoiceCommand::TextMode);
        assert_eq!(VoiceCommand::parse("ok goodbye then"), VoiceCommand::Exit);
        assert_eq!(VoiceCommand::parse("quit"), VoiceCommand::Exit);
        assert_eq!(VoiceCommand::parse("what time is it"), VoiceCommand::Utterance);
    }

    #[tokio::test]
    async fn text_session_routes_and_exits() {
        let (mut session, peer) = session("hello\n\n   \nwhat is 2 + 2\nvoice\nquit\nnever read\n", None);
        session.run(false).await.unwrap();

        // Blank lines never reach the manager; "voice" and "quit" are commands.
        assert_eq!(session.manager.history().len(), 4);

        let out = transcript(session, peer).await;
        assert!(out.contains("Assistant Text Interface"));
        assert!(out.contains("Assistant: Hi!"));
        assert!(out.contains("Assistant: The result is: 4"));
        assert!(out.contains(&format!("Assistant: {VOICE_UNAVAILABLE}")));
        assert!(out.trim_end().ends_with(&format!("Assistant: {GOODBYE}")));
    }

    #[tokio::test]
    async fn end_of_input_ends_session() {
        let (mut session, peer) = session("", None);
        session.run(false).await.unwrap();
        assert!(session.manager.history().is_empty());
        assert!(transcript(session, peer).await.contains(GOODBYE));
    }

    #[tokio::test]
    async fn voice_requested_but_unavailable_starts_in_text() {
        let (mut session, peer) = session("exit\n", None);
        session.run(true).await.unwrap();
        let out = transcript(session, peer).await;
        assert!(out.starts_with(&format!("Assistant: {VOICE_UNAVAILABLE}")));
        assert!(out.contains("Text Interface"));
    }

    #[tokio::test]
    async fn voice_round_trip_and_back_to_text() {
        let listener = ScriptedListener::new(vec![
            Ok(Some("tell me a joke")),
            Ok(None),
            Err(VoiceError::Service("recognizer offline".into())),
            Ok(Some("text mode")),
        ]);
        let speaker = Arc::new(RecordingSpeaker::default());
        let voice = voice_io(listener, speaker.clone(), true);

        let (mut session, peer) = session("voice\nbye\n", Some(voice));
        session.run(false).await.unwrap();

        let spoken = speaker.spoken.lock().unwrap().clone();
        assert_eq!(spoken.len(), 1);
        assert!(JOKES.contains(&spoken[0].as_str()));
        assert_eq!(session.manager.history().len(), 2);

        let out = transcript(session, peer).await;
        assert!(out.contains("Assistant Voice Interface"));
        assert!(out.contains("You said: tell me a joke"));
        assert!(out.contains("No speech detected"));
        assert!(out.contains("error with the speech recognition service"));
        assert!(out.contains("Switching to text mode..."));
        assert!(out.trim_end().ends_with(&format!("Assistant: {GOODBYE}")));
    }

    #[tokio::test]
    async fn spoken_goodbye_ends_session() {
        let listener = ScriptedListener::new(vec![Ok(Some("Goodbye assistant"))]);
        let speaker = Arc::new(RecordingSpeaker::default());
        let voice = voice_io(listener, speaker.clone(), false);

        let (mut session, peer) = session("", Some(voice));
        session.run(true).await.unwrap();

        assert_eq!(*speaker.spoken.lock().unwrap(), vec![GOODBYE.to_string()]);
        assert!(session.manager.history().is_empty());
        // The speaker handles output itself, so nothing is echoed.
        assert!(!transcript(session, peer).await.contains(&format!("Assistant: {GOODBYE}")));
    }

    #[tokio::test]
    async fn failed_speech_output_falls_back_to_print() {
        let listener = ScriptedListener::new(vec![Ok(Some("what's 6 * 7")), Ok(Some("quit"))]);
        let voice = voice_io(listener, Arc::new(BrokenSpeaker), false);

        let (mut session, peer) = session("", Some(voice));
        session.run(true).await.unwrap();

        let out = transcript(session, peer).await;
        assert!(out.contains("Assistant: The result is: 42"));
        assert!(out.contains(&format!("Assistant: {GOODBYE}")));
    }

    #[tokio::test]
    async fn interrupt_while_waiting_for_input() {
        // Input that stays open without ever sending a line.
        let (_keyboard, stdin) = tokio::io::duplex(64);
        let (out, peer) = tokio::io::duplex(1 << 16);
        let channel = CliChannel::with_io(stdin, out);
        let mut session = Session::new("Assistant", manager(), channel, None);

        session
            .run_until(false, tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();

        assert!(session.manager.history().is_empty());
        let out = transcript(session, peer).await;
        assert!(out.trim_end().ends_with(&format!("Assistant: {INTERRUPTED}")));
    }

    #[tokio::test]
    async fn interrupt_during_completion_ends_session() {
        let started = Arc::new(Notify::new());
        let provider = Arc::new(HangingProvider {
            started: started.clone(),
        });
        let (mut session, peer) =
            session_with(manager_with(provider), "tell me about rust\nnever read\n", None);

        session
            .run_until(false, async move { started.notified().await })
            .await
            .unwrap();

        // The user entry was logged; no reply ever was.
        assert_eq!(session.manager.history().len(), 1);
        let out = transcript(session, peer).await;
        assert!(!out.contains(GOODBYE));
        assert!(out.trim_end().ends_with(&format!("Assistant: {INTERRUPTED}")));
    }

    #[tokio::test]
    async fn interrupt_during_speech_ends_session() {
        let started = Arc::new(Notify::new());
        let listener = ScriptedListener::new(vec![Ok(Some("what is 6 * 7"))]);
        let speaker = Arc::new(HangingSpeaker {
            started: started.clone(),
        });
        let voice = voice_io(listener, speaker, true);
        let (mut session, peer) = session("", Some(voice));

        session
            .run_until(true, async move { started.notified().await })
            .await
            .unwrap();

        assert_eq!(session.manager.history().len(), 2);
        let out = transcript(session, peer).await;
        assert!(out.contains("Assistant: The result is: 42"));
        assert!(out.trim_end().ends_with(&format!("Assistant: {INTERRUPTED}")));
    }
}
