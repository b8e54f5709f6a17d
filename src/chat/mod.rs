//! Conversation threads and their local store.
//!
//! [`ChatStore`] keeps threads ordered most-recently-active first and is
//! used as a local mirror of what the backend returns for `/api/threads`.
//!
//! # Example
//!
//! ```rust
//! use pawzzle_client::chat::{ChatStore, EnsureThread, NewMessage};
//!
//! let store = ChatStore::new();
//! store.ensure_thread(EnsureThread::new(7, "Ana"));
//! store.add_message("7", NewMessage::from_user("hi"));
//!
//! assert_eq!(store.threads()[0].messages.len(), 1);
//! ```

mod store;
mod thread;

pub use store::ChatStore;
pub use thread::{
    AdoptionInfo, AdoptionStatus, ChatMessage, ChatThread, EnsureThread, NewMessage, Sender,
    ThreadKeyPolicy, ViewerRole,
};
