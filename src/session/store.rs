//! Session store with change notification.

use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::observer::{Listeners, Subscription};

/// Kind of account behind a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Individual,
    Institution,
}

/// What the user signed up to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserIntent {
    Giver,
    Adopter,
}

/// Identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub user_intent: Option<UserIntent>,
}

/// Bearer token plus the user it belongs to.
///
/// This is also the body returned by the login and register endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: SessionUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<AuthSession>,
    guest_mode: bool,
}

/// Shared holder of "who is logged in" and "is guest browsing on".
///
/// Mutation and notification happen under one re-entrant dispatch guard, so
/// observers on other threads see notifications in mutation order while an
/// observer may still call back into the store from its own callback.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    state: RwLock<SessionState>,
    dispatch: ReentrantMutex<()>,
    session_listeners: Listeners<Option<AuthSession>>,
    guest_listeners: Listeners<bool>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("SessionStore")
            .field("session", &state.session)
            .field("guest_mode", &state.guest_mode)
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store with no session and guest mode off.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                state: RwLock::new(SessionState::default()),
                dispatch: ReentrantMutex::new(()),
                session_listeners: Listeners::new(),
                guest_listeners: Listeners::new(),
            }),
        }
    }

    /// The current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<AuthSession> {
        self.inner.state.read().session.clone()
    }

    /// The current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .session
            .as_ref()
            .map(|session| session.token.clone())
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner.state.read().session.is_some()
    }

    /// Replace the current session.
    ///
    /// Setting `Some` forces guest mode off and notifies guest observers
    /// first. Session observers are always notified, even if the value did not
    /// change.
    pub fn set_session(&self, session: Option<AuthSession>) {
        let _dispatch = self.inner.dispatch.lock();

        let clears_guest = session.is_some();
        {
            let mut state = self.inner.state.write();
            state.session.clone_from(&session);
            if clears_guest {
                state.guest_mode = false;
            }
        }

        debug!(
            name: "session.changed",
            user_id = session.as_ref().map(|s| s.user.id),
            "Session updated"
        );

        if clears_guest {
            self.inner.guest_listeners.notify(&false);
        }
        self.inner.session_listeners.notify(&session);
    }

    /// Clear the session (logout).
    pub fn clear(&self) {
        self.set_session(None);
    }

    /// Observe session changes. No replay of the current value.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Option<AuthSession>) + Send + Sync + 'static,
    {
        self.inner.session_listeners.subscribe(callback)
    }

    /// Whether guest browsing is enabled.
    #[must_use]
    pub fn guest_mode(&self) -> bool {
        self.inner.state.read().guest_mode
    }

    /// Toggle guest browsing. Does not touch an existing session.
    pub fn set_guest_mode(&self, enabled: bool) {
        let _dispatch = self.inner.dispatch.lock();
        self.inner.state.write().guest_mode = enabled;
        debug!(name: "session.guest_mode", enabled, "Guest mode updated");
        self.inner.guest_listeners.notify(&enabled);
    }

    /// Observe guest-mode changes. No replay of the current value.
    pub fn subscribe_guest_mode<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.inner.guest_listeners.subscribe(callback)
    }
}
