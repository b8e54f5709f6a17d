//! REST client for the Pawzzle backend.
//!
//! Every call resolves to a [`Reply`] on any 2xx status and to an
//! [`ApiError`] otherwise. Calls that need a session read the bearer token
//! from the shared [`SessionStore`](crate::session::SessionStore).
//!
//! ```rust,no_run
//! use pawzzle_client::api::{ApiClient, Reply};
//! use pawzzle_client::{ClientConfig, SessionStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(&ClientConfig::load()?, SessionStore::new())?;
//!
//! match client.pets().list().await? {
//!     Reply::Data(pets) => println!("{} pets", pets.len()),
//!     Reply::NoContent | Reply::Absent => println!("nothing to show"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod stream;
mod types;

pub use client::{
    AdoptionsApi, AgentApi, ApiClient, AuthApi, HomeApi, PetsApi, ThreadsApi, UsersApi,
};
pub use error::{ApiError, Result};
pub use stream::{AssistantApi, AssistantEvent, AssistantStream};
pub use types::{
    AdoptionSummary, AgentMessage, AgentRole, AssistantRequest, ContentCategory,
    CreateContentRequest, CreatePetRequest, CreateThreadRequest, Evaluation, EvaluationSummary,
    HomeContent, HomeFeed, LoginRequest, PersonalityTags, PetCard, PetDetail, PetStatus,
    QuestionAnswer, Recommendation, RecommendationItem, RecommendationRequest, RegisterRequest,
    Reply, SendMessageRequest, Species, UploadedImage, UserProfile,
};
