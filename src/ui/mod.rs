pub mod conversation;

pub use conversation::{ConversationAction, ConversationManager};
