//! Stand-in providers for exercising the pipeline without a network.

use parley_core::error::ProviderError;
use parley_core::message::Message;
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// Returns scripted replies in order.
///
/// Panics if called more often than it has replies, so a test notices
/// unexpected completion calls.
pub struct ScriptedProvider {
    replies: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: replies.into_iter().map(String::from).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        let Some(reply) = self.replies.get(index) else {
            panic!(
                "ScriptedProvider: no more replies (call #{index}, have {})",
                self.replies.len()
            );
        };
        requests.push(request);
        Ok(make_text_response(reply))
    }
}

/// Fails every call with a fixed error.
pub struct FailingProvider {
    error: ProviderError,
    calls: Mutex<usize>,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self {
            error,
            calls: Mutex::new(0),
        }
    }

    /// Simulated transport failure.
    pub fn network() -> Self {
        Self::new(ProviderError::Network("connection refused".into()))
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}

/// A plain text response as a provider would return it.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
