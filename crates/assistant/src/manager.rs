//! The conversation manager: one turn of the assistant pipeline.

use crate::completion::CompletionClient;
use crate::history::ConversationLog;
use crate::router::CapabilityRouter;
use parley_core::error::{Error, Result};
use parley_core::message::Message;
use tracing::{debug, info};

/// Owns the conversation log and drives each turn.
///
/// A turn appends the user utterance, asks the router for a skill reply,
/// falls back to completion when no skill matched, then appends the reply.
/// The user entry is logged before completion runs, because completion
/// reads it from the log.
pub struct ConversationManager {
    router: CapabilityRouter,
    completion: CompletionClient,
    log: ConversationLog,
}

impl ConversationManager {
    pub fn new(router: CapabilityRouter, completion: CompletionClient) -> Self {
        Self {
            router,
            completion,
            log: ConversationLog::default(),
        }
    }

    /// Keep at most `limit` log entries.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.log = ConversationLog::with_capacity(limit);
        self
    }

    /// Process one utterance and return the reply.
    ///
    /// Blank input is rejected with [`Error::EmptyInput`] and leaves the log
    /// untouched. Every other input gets a non-empty reply: skill and
    /// completion failures are already folded into fixed messages.
    pub async fn process_input(&mut self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        info!(chars = text.len(), "Processing input");
        self.log.push(Message::user(text));

        let response = match self.router.route(text).await {
            Some(reply) => reply,
            None => {
                debug!("No capability matched, falling back to completion");
                self.completion.complete(&self.log).await
            }
        };

        self.log.push(Message::assistant(&response));
        debug!(history = self.log.len(), "Turn complete");
        Ok(response)
    }

    /// Read-only view of the conversation so far.
    pub fn history(&self) -> &ConversationLog {
        &self.log
    }

    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }
}
