//! Front-ends for Parley.
//!
//! - **CLI**: interactive terminal chat (stdin/stdout)
//! - **Voice**: command-backed speech recognition and synthesis, with
//!   availability detected once at startup

pub mod cli;
pub mod voice;

pub use cli::CliChannel;
pub use voice::{
    CommandSpeechToText, CommandTextToSpeech, PrintSpeaker, VoiceCapabilities,
};
