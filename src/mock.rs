use crate::error::ReplyUnavailable;
use crate::llm::{CompletionService, LlmRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Completion service that never touches the network.
///
/// Replies are taken from a script in order; once the script is exhausted it
/// echoes the last user turn. A gated mock holds every request until
/// [`release`](Self::release) is called, which lets callers observe the
/// in-flight state.
pub struct MockCompletion {
    script: Mutex<VecDeque<Result<String, ReplyUnavailable>>>,
    requests: Mutex<Vec<LlmRequest>>,
    gate: Option<Semaphore>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Queue a scripted result
    pub fn with_reply(self, reply: Result<String, ReplyUnavailable>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let one held request complete
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Number of requests received so far
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn echo(request: &LlmRequest) -> String {
        let question = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        format!("(offline) You asked: {question}")
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, request: LlmRequest) -> Result<String, ReplyUnavailable> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| Ok(Self::echo(&request)))
    }
}
