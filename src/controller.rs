//! Conversation state and the single-flight request discipline around it.

use crate::error::ReplyUnavailable;
use crate::llm::{CompletionService, LlmRequest, build_request_payload};
use crate::message::Message;
use crate::prompts::FALLBACK_REPLY;
use crossterm::event::KeyCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply,
}

/// What `submit` did with its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// User turn appended and request started
    Dispatched,
    /// Text was blank after trimming
    Empty,
    /// A request is already in flight
    Busy,
}

/// Everything the view needs to render a session
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    history: Vec<Message>,
    pending: bool,
    draft: String,
}

impl ConversationState {
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }
}

struct ReplyEnvelope {
    generation: u64,
    result: Result<String, ReplyUnavailable>,
}

/// Owns the transcript and mediates every call to the completion service.
///
/// At most one request is in flight. Replies come back over a channel and are
/// applied by [`poll_replies`](Self::poll_replies) or
/// [`next_reply`](Self::next_reply); each dispatch carries the generation it
/// was issued in, and [`reset`](Self::reset) moves to a new generation so late
/// replies never land in a cleared transcript.
pub struct ConversationController {
    service: Arc<dyn CompletionService>,
    state: ConversationState,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    reply_tx: mpsc::UnboundedSender<ReplyEnvelope>,
    reply_rx: mpsc::UnboundedReceiver<ReplyEnvelope>,
}

impl ConversationController {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            service,
            state: ConversationState::default(),
            generation: 0,
            in_flight: None,
            reply_tx,
            reply_rx,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn history(&self) -> &[Message] {
        &self.state.history
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn phase(&self) -> Phase {
        if self.state.pending {
            Phase::AwaitingReply
        } else {
            Phase::Idle
        }
    }

    pub fn draft(&self) -> &str {
        &self.state.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.state.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
    }

    /// Send a user turn.
    ///
    /// Must be called from within a tokio runtime. The user message is in
    /// `history` and `pending` is set before the request task is spawned.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if self.state.pending {
            debug!("submit ignored: request already in flight");
            return SubmitOutcome::Busy;
        }

        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }

        let request = LlmRequest::new(build_request_payload(&self.state.history, text));

        self.state.history.push(Message::user(text));
        self.state.draft.clear();
        self.state.pending = true;

        let generation = self.generation;
        let service = Arc::clone(&self.service);
        let tx = self.reply_tx.clone();

        debug!(generation, turns = request.messages.len(), "dispatching completion request");

        self.in_flight = Some(tokio::spawn(async move {
            let result = service.complete(request).await;
            let _ = tx.send(ReplyEnvelope { generation, result });
        }));

        SubmitOutcome::Dispatched
    }

    /// Apply every reply that has already arrived. Returns how many were
    /// appended to the transcript.
    pub fn poll_replies(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.reply_rx.try_recv() {
            if self.apply(envelope) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the in-flight request to resolve and return the appended
    /// assistant message. Returns `None` when nothing is in flight.
    pub async fn next_reply(&mut self) -> Option<&Message> {
        while self.state.pending {
            let envelope = self.reply_rx.recv().await?;
            if self.apply(envelope) {
                return self.state.history.last();
            }
        }
        None
    }

    fn apply(&mut self, envelope: ReplyEnvelope) -> bool {
        if envelope.generation != self.generation {
            debug!(
                stale = envelope.generation,
                current = self.generation,
                "discarding reply from a reset conversation"
            );
            return false;
        }

        let content = match envelope.result {
            Ok(text) => text,
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "completion unavailable, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        };

        self.state.history.push(Message::assistant(content));
        self.state.pending = false;
        self.in_flight = None;
        true
    }

    /// Clear the transcript.
    ///
    /// An in-flight request is aborted and its reply, if it still arrives, is
    /// discarded. The draft is kept.
    pub fn reset(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.generation += 1;
        self.state.history.clear();
        self.state.pending = false;
        info!(generation = self.generation, "conversation reset");
    }

    /// Plain Enter submits the draft and suppresses newline insertion.
    /// Returns whether the key was consumed.
    pub fn handle_submit_shortcut(&mut self, key: KeyCode, shift_held: bool) -> bool {
        if key != KeyCode::Enter || shift_held {
            return false;
        }
        let draft = self.state.draft.clone();
        self.submit(&draft);
        true
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Origin;
    use crate::mock::MockCompletion;

    #[tokio::test]
    async fn test_starts_idle_and_empty() {
        let controller = ConversationController::new(Arc::new(MockCompletion::new()));
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.history().is_empty());
        assert!(!controller.is_pending());
        assert_eq!(controller.draft(), "");
    }

    #[tokio::test]
    async fn test_submit_trims_and_clears_draft() {
        let mock = Arc::new(MockCompletion::new());
        let mut controller = ConversationController::new(mock.clone());
        controller.set_draft("  What is a heap?\n");

        let outcome = controller.submit("  What is a heap?\n");

        assert_eq!(outcome, SubmitOutcome::Dispatched);
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.history()[0].content(), "What is a heap?");
        assert_eq!(controller.history()[0].origin(), Origin::User);
        assert_eq!(controller.draft(), "");
        assert_eq!(controller.phase(), Phase::AwaitingReply);
    }

    #[tokio::test]
    async fn test_shift_enter_is_not_consumed() {
        let mock = Arc::new(MockCompletion::new());
        let mut controller = ConversationController::new(mock.clone());
        controller.set_draft("line one");

        assert!(!controller.handle_submit_shortcut(KeyCode::Enter, true));
        assert!(!controller.handle_submit_shortcut(KeyCode::Char('a'), false));
        assert!(controller.history().is_empty());
        assert_eq!(controller.draft(), "line one");
    }

    #[tokio::test]
    async fn test_enter_submits_draft() {
        let mock = Arc::new(MockCompletion::new().with_reply(Ok("pong".to_string())));
        let mut controller = ConversationController::new(mock.clone());
        controller.set_draft("ping");

        assert!(controller.handle_submit_shortcut(KeyCode::Enter, false));
        let reply = controller.next_reply().await.unwrap();
        assert_eq!(reply.content(), "pong");
        assert_eq!(controller.draft(), "");
    }

    #[tokio::test]
    async fn test_enter_on_blank_draft_is_consumed_but_does_nothing() {
        let mock = Arc::new(MockCompletion::new());
        let mut controller = ConversationController::new(mock.clone());
        controller.set_draft("   ");

        assert!(controller.handle_submit_shortcut(KeyCode::Enter, false));
        assert!(controller.history().is_empty());
        assert!(!controller.is_pending());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_enter_while_busy_keeps_draft() {
        let mock = Arc::new(MockCompletion::new().gated());
        let mut controller = ConversationController::new(mock.clone());
        controller.submit("first");
        controller.set_draft("second");

        assert!(controller.handle_submit_shortcut(KeyCode::Enter, false));
        assert_eq!(controller.draft(), "second");
        assert_eq!(controller.history().len(), 1);

        mock.release();
        controller.next_reply().await;
    }

    #[tokio::test]
    async fn test_next_reply_without_request_returns_none() {
        let mut controller = ConversationController::new(Arc::new(MockCompletion::new()));
        assert!(controller.next_reply().await.is_none());
    }
}
