//! EduMate: a terminal study assistant that forwards questions to a hosted
//! LLM completion API and keeps the conversation transcript.

pub mod app;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod llm;
pub mod logging;
pub mod message;
pub mod mock;
pub mod prompts;
pub mod ui;

pub use config::Config;
pub use controller::{ConversationController, ConversationState, Phase, SubmitOutcome};
pub use error::ReplyUnavailable;
pub use llm::{CompletionService, LlmMessage, LlmRequest, OpenRouterClient, build_request_payload};
pub use message::{Message, Origin};
pub use mock::MockCompletion;
