//! Authenticated session and guest-mode state.
//!
//! The app root owns a single [`SessionStore`] and hands out clones of it;
//! every clone observes the same state.
//!
//! # Example
//!
//! ```rust
//! use pawzzle_client::session::{AuthSession, SessionStore, SessionUser};
//!
//! let store = SessionStore::new();
//! store.set_guest_mode(true);
//!
//! store.set_session(Some(AuthSession {
//!     token: "t-1".to_string(),
//!     user: SessionUser {
//!         id: 1,
//!         name: "Ana".to_string(),
//!         email: "ana@example.com".to_string(),
//!         user_type: None,
//!         user_intent: None,
//!     },
//! }));
//!
//! assert!(!store.guest_mode());
//! assert_eq!(store.token().as_deref(), Some("t-1"));
//! ```

mod store;

pub use store::{AuthSession, SessionStore, SessionUser, UserIntent, UserType};
