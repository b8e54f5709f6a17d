//! Request and response bodies for the backend API.
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::chat::AdoptionStatus;
use crate::session::{UserIntent, UserType};

// =============================================================================
// Reply envelope
// =============================================================================

/// Outcome of a successful HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// The body decoded as `T`.
    Data(T),
    /// HTTP 204.
    NoContent,
    /// 2xx, but the body was empty or did not decode as `T`.
    Absent,
}

impl<T> Reply<T> {
    /// The decoded body, if there was one.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            Self::NoContent | Self::Absent => None,
        }
    }

    #[must_use]
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Self::Data(value) => Reply::Data(f(value)),
            Self::NoContent => Reply::NoContent,
            Self::Absent => Reply::Absent,
        }
    }
}

/// Error body shape; both fields are optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<UserIntent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Pets & users
// =============================================================================

/// Listing card for a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub energy: String,
    #[serde(default, rename = "trait")]
    pub r#trait: String,
    #[serde(default)]
    pub distance: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Species {
    Cat,
    Dog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PetStatus {
    Open,
    Matched,
    Adopted,
}

/// Full pet record from `GET /api/pets/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub species: Option<Species>,
    #[serde(default)]
    pub status: Option<PetStatus>,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form tags as produced by the backend's extraction step.
    #[serde(default)]
    pub tags: Option<serde_json::Value>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_type: Option<UserType>,
}

/// Public profile from `GET /api/users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub pets: Vec<PetCard>,
}

/// Body of `POST /api/pets`, publishing a pet for rehoming.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetRequest {
    pub name: String,
    pub species: Species,
    pub breed: String,
    /// Age in years; must be positive.
    pub age: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PersonalityTagsRequest {
    pub text: String,
}

/// Tags suggested for a free-text personality sketch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersonalityTags {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Result of `POST /api/pets/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub url: String,
}

// =============================================================================
// Home feed
// =============================================================================

/// Section a home content card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentCategory {
    Update,
    Guide,
}

/// `GET /api/home`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    #[serde(default)]
    pub pet_cards: Vec<PetCard>,
    #[serde(default)]
    pub updates: Vec<HomeContent>,
    #[serde(default)]
    pub guides: Vec<HomeContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeContent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    /// Card background colour, e.g. `#FCE7CF`.
    #[serde(default)]
    pub tone: Option<String>,
}

/// Body of `POST /api/home/content`. Tag and tone default per category.
#[derive(Debug, Clone, Serialize)]
pub struct CreateContentRequest {
    pub category: ContentCategory,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

// =============================================================================
// Matching agent
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    User,
    Assistant,
}

/// One turn of the matching interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: AgentRole,
    pub content: String,
}

impl AgentMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: AgentRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: AgentRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EvaluationRequest<'a> {
    pub messages: &'a [AgentMessage],
}

/// The agent's read of the interview so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// The agent has enough to recommend.
    #[serde(default, rename = "endverification")]
    pub complete: bool,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub next_questions: Vec<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub raw_response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub profile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Body of `POST /api/agent/recommend`.
///
/// Without `pets` the backend picks candidates itself.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub question_answers: Vec<QuestionAnswer>,
    pub messages: Vec<AgentMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pets: Vec<PetCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default)]
    pub items: Vec<RecommendationItem>,
    #[serde(default)]
    pub raw_response: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub debug: Option<String>,
}

/// A recommended pet, by [`PetCard::id`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationItem {
    pub id: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

// =============================================================================
// Threads & adoptions
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    pub owner_id: i64,
    pub pet_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Entry of `GET /api/adoptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionSummary {
    pub id: String,
    #[serde(default)]
    pub pet: Option<PetCard>,
    pub status: AdoptionStatus,
    #[serde(default)]
    pub adopted_at: Option<i64>,
}

// =============================================================================
// Assistant stream
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AssistantRequest {
    pub message: String,
}

/// One `data:` payload of the assistant stream.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub done: bool,
}
