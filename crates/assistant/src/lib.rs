//! The Parley conversation pipeline.
//!
//! Each turn follows the same path:
//!
//! 1. **Log** the user utterance
//! 2. **Route** it by keyword to a built-in skill, in fixed priority order
//! 3. **Fall back** to the completion provider when no skill matched
//! 4. **Log** the reply, keeping only the most recent entries
//!
//! Turns run one at a time; the manager is borrowed mutably for each.

pub mod completion;
pub mod history;
pub mod manager;
pub mod router;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use completion::{CompletionClient, FALLBACK_REPLY};
pub use history::ConversationLog;
pub use manager::ConversationManager;
pub use router::CapabilityRouter;
