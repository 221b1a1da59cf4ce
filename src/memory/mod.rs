//! Session memory
//!
//! Holds the conversation log a session renders from. Session scoped only:
//! nothing here is persisted across restarts.

pub mod store;

pub use store::{ConversationLog, WELCOME_MESSAGE};
