//! Error types for the Parley domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for a conversation turn or session.
#[derive(Debug, Error)]
pub enum Error {
    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Input errors ---
    #[error("Input was empty")]
    EmptyInput,
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty completion from {0}")]
    EmptyCompletion(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

#[derive(Debug, Clone, Error)]
pub enum VoiceError {
    #[error("Speech service failed: {0}")]
    Service(String),

    #[error("Speech output failed: {0}")]
    Playback(String),
}

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Skill request failed: {skill}: {reason}")]
    RequestFailed { skill: String, reason: String },

    #[error("Invalid skill input: {0}")]
    InvalidInput(String),
}
