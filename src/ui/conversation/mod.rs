//! Conversation UI components for the chat interface

pub mod composer;
pub mod history;
pub mod indicator;
pub mod manager;

pub use composer::{ComposerView, ConversationComposer};
pub use history::{TranscriptView, wrap_text};
pub use manager::{ConversationAction, ConversationManager};
