//! Pawzzle client core
//!
//! The state and networking layer shared by the Pawzzle pet-adoption apps:
//! who is signed in, which conversations exist locally, and how to talk to
//! the backend.
//!
//! # Architecture
//!
//! - **Session**: the signed-in user and guest-mode flag, observable
//! - **Chat**: local thread list, most recently active first, observable
//! - **API**: typed REST client plus the streaming AI assistant
//! - **Sync**: mirrors backend thread operations into the chat store
//!
//! # Modules
//!
//! - [`session`]: Authenticated session and guest mode
//! - [`chat`]: Conversation threads and their local store
//! - [`api`]: REST client, errors and wire types
//! - [`sync`]: Backend-backed thread operations
//! - [`config`]: Layered client configuration
//! - [`i18n`]: User-facing message catalog
//! - [`telemetry`]: Optional `tracing` subscriber setup
//!
//! # Example
//!
//! ```rust,no_run
//! use pawzzle_client::{ApiClient, ChatStore, ClientConfig, SessionStore, ThreadSync};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load()?;
//! let session = SessionStore::new();
//! let client = ApiClient::new(&config, session.clone())?;
//! let sync = ThreadSync::new(
//!     client.clone(),
//!     ChatStore::with_policy(config.chat.thread_key_policy),
//! );
//!
//! client.auth().login("ana@example.com", "secret").await?;
//! let threads = sync.refresh(&CancellationToken::new()).await?;
//! println!("{} threads", threads.len());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]

pub mod api;
pub mod chat;
pub mod config;
pub mod i18n;
pub mod observer;
pub mod session;
pub mod sync;
pub mod telemetry;

pub use api::{ApiClient, ApiError, Reply};
pub use chat::ChatStore;
pub use config::ClientConfig;
pub use i18n::Locale;
pub use session::SessionStore;
pub use sync::ThreadSync;
