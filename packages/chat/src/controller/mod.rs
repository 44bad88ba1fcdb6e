//! Controllers driven by a presentation layer.
//!
//! Both controllers are plain owned values mutated through `&mut self`; they
//! share one [`crate::connection::ConnectionManager`] per tab.

pub mod conversation_list;
pub mod thread;
pub mod typing;

pub use conversation_list::{ConversationListController, ListStatus};
pub use thread::{
    HistoryFetcher, HistoryRequest, MessageSide, SEND_FAILED_NOTICE, ThreadController, ThreadPhase,
};
pub use typing::TypingDebouncer;
