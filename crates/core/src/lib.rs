//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley assistant.
//! This crate has **no I/O dependencies**: it defines the domain model that
//! the other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping the completion backend or voice engines via configuration
//! - Easy testing with scripted/failing stand-ins
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod channel;
pub mod skill;
pub mod voice;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use channel::{Channel, ChannelMessage};
pub use skill::{Capability, CapabilityTable, Skill};
pub use voice::{SpeechToText, TextToSpeech};
