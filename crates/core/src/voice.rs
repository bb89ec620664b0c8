//! Voice traits: speech-to-text and text-to-speech collaborators.
//!
//! The conversation pipeline never touches audio; the front-end loop
//! consumes these two narrow contracts.

use async_trait::async_trait;
use std::time::Duration;
use crate::error::VoiceError;

/// Turns microphone input into text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Listen for one phrase.
    ///
    /// `timeout` bounds the wait for speech to start, `phrase_limit` bounds
    /// the phrase itself. Returns `Ok(None)` when nothing was said in time or
    /// the speech could not be understood, and `Err(VoiceError::Service)`
    /// when the recognition backend itself failed.
    async fn listen(
        &self,
        timeout: Duration,
        phrase_limit: Duration,
    ) -> std::result::Result<Option<String>, VoiceError>;
}

/// Speaks text aloud.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Speak `text`, returning once playback has finished.
    async fn speak(&self, text: &str) -> std::result::Result<(), VoiceError>;
}
