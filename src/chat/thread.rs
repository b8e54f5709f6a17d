//! Chat thread and message types.
//!
//! These mirror the JSON the backend returns for `/api/threads`, so the same
//! values flow between the REST client and the in-memory [`ChatStore`].
//!
//! [`ChatStore`]: super::ChatStore

use serde::{Deserialize, Serialize};

/// Who wrote a message, from the local user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The local user.
    User,
    /// The counterpart (a pet's owner).
    Owner,
}

/// Role of the local user in a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewerRole {
    Owner,
    Adopter,
}

/// Adoption pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdoptionStatus {
    Apply,
    Screening,
    Trial,
    Adopted,
}

/// Adoption sub-state attached to a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionInfo {
    pub id: String,
    pub status: AdoptionStatus,
    /// Epoch milliseconds.
    #[serde(default)]
    pub adopted_at: Option<i64>,
}

/// A single immutable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// A message before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: Sender,
    pub text: String,
}

impl NewMessage {
    /// A message written by the local user.
    pub fn from_user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// A message written by the counterpart.
    pub fn from_owner(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Owner,
            text: text.into(),
        }
    }
}

/// Conversation between the local user and one counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    pub id: String,
    #[serde(rename = "ownerId")]
    pub counterpart_id: i64,
    #[serde(rename = "ownerName", default)]
    pub counterpart_name: String,
    #[serde(rename = "petId", default)]
    pub subject_id: Option<String>,
    #[serde(rename = "petName", default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_role: Option<ViewerRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adoption: Option<AdoptionInfo>,
}

impl ChatThread {
    /// The most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Parameters for [`ChatStore::ensure_thread`](super::ChatStore::ensure_thread).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnsureThread {
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub subject_id: Option<String>,
    pub subject_name: Option<String>,
}

impl EnsureThread {
    pub fn new(counterpart_id: i64, counterpart_name: impl Into<String>) -> Self {
        Self {
            counterpart_id,
            counterpart_name: counterpart_name.into(),
            subject_id: None,
            subject_name: None,
        }
    }

    /// Scope the thread to a subject (a pet listing).
    #[must_use]
    pub fn with_subject(
        mut self,
        subject_id: impl Into<String>,
        subject_name: impl Into<String>,
    ) -> Self {
        self.subject_id = Some(subject_id.into());
        self.subject_name = Some(subject_name.into());
        self
    }
}

/// How a thread id is derived from the counterpart (and subject).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadKeyPolicy {
    /// One thread per counterpart, whatever the subject. Subjects merge.
    #[default]
    PerCounterpart,
    /// One thread per counterpart and subject: `"{counterpart}:{subject}"`.
    /// Falls back to the counterpart id when no subject is given.
    PerSubject,
}

impl ThreadKeyPolicy {
    /// Derive the thread id for `params`.
    #[must_use]
    pub fn thread_id(self, params: &EnsureThread) -> String {
        match (self, non_empty(params.subject_id.as_deref())) {
            (Self::PerSubject, Some(subject)) => format!("{}:{subject}", params.counterpart_id),
            _ => params.counterpart_id.to_string(),
        }
    }

    /// Whether `thread` is the conversation `params` asks for.
    ///
    /// Server threads carry their own ids, so this compares the counterpart
    /// (and, per subject, the subject) rather than the id.
    #[must_use]
    pub fn matches(self, thread: &ChatThread, params: &EnsureThread) -> bool {
        if thread.counterpart_id != params.counterpart_id {
            return false;
        }
        match self {
            Self::PerCounterpart => true,
            Self::PerSubject => {
                non_empty(thread.subject_id.as_deref())
                    == non_empty(params.subject_id.as_deref())
            }
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
