//! HTTP client for the Pawzzle backend.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{
    api::{
        error::{ApiError, Result},
        types::*,
    },
    chat::{ChatMessage, ChatThread},
    config::ClientConfig,
    i18n::{Locale, MessageKey},
    session::{AuthSession, SessionStore},
};

/// Whether a call needs the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Public,
    Required,
}

/// HTTP client for the backend API.
///
/// Cloning is cheap; clones share the connection pool and the session store.
///
/// # Example
///
/// ```rust,no_run
/// use pawzzle_client::{ApiClient, ClientConfig, SessionStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = SessionStore::new();
/// let client = ApiClient::new(&ClientConfig::with_base_url("http://localhost:8080"), session)?;
///
/// client.auth().login("ana@example.com", "secret").await?;
/// let threads = client.threads().list().await?.into_option().unwrap_or_default();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: SessionStore,
    locale: Locale,
    stream_timeout: Duration,
}

impl ApiClient {
    /// Create a client for the configured backend.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout())
            .build()?;
        Self::with_client(config, session, http)
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(
        config: &ClientConfig,
        session: SessionStore,
        http: reqwest::Client,
    ) -> Result<Self> {
        let base_url = config.api.resolved_base_url();
        Url::parse(&base_url)?;
        Ok(Self {
            base_url,
            http,
            session,
            locale: config.locale,
            stream_timeout: config.api.stream_timeout(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session store tokens are read from.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub(crate) fn stream_timeout(&self) -> Duration {
        self.stream_timeout
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the auth API.
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    /// Access the pets API.
    pub fn pets(&self) -> PetsApi<'_> {
        PetsApi { client: self }
    }

    /// Access the user profile API.
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { client: self }
    }

    /// Access the direct-message threads API.
    pub fn threads(&self) -> ThreadsApi<'_> {
        ThreadsApi { client: self }
    }

    /// Access the adoptions API.
    pub fn adoptions(&self) -> AdoptionsApi<'_> {
        AdoptionsApi { client: self }
    }

    /// Access the home feed API.
    pub fn home(&self) -> HomeApi<'_> {
        HomeApi { client: self }
    }

    /// Access the matching agent API.
    pub fn agent(&self) -> AgentApi<'_> {
        AgentApi { client: self }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Join path segments onto the base URL, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a request, attaching the bearer token when there is one.
    ///
    /// `Auth::Required` with no session fails locally and sends nothing.
    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
        auth: Auth,
    ) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        let token = self.session.token();
        if auth == Auth::Required && token.is_none() {
            debug!(name: "api.request.skipped", path = url.path(), "No session for authenticated call");
            return Err(ApiError::Unauthenticated);
        }

        let mut rb = self.http.request(method, url);
        if let Some(token) = token {
            rb = rb.bearer_auth(token);
        }
        Ok(rb)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        auth: Auth,
    ) -> Result<Reply<T>> {
        let rb = self.request(Method::GET, segments, auth)?;
        self.execute(rb).await
    }

    pub(crate) async fn post<B, T>(
        &self,
        segments: &[&str],
        body: Option<&B>,
        auth: Auth,
    ) -> Result<Reply<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut rb = self.request(Method::POST, segments, auth)?;
        if let Some(body) = body {
            rb = rb.json(body);
        }
        self.execute(rb).await
    }

    pub(crate) async fn execute<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<Reply<T>> {
        let response = rb.send().await.inspect_err(|e| {
            warn!(name: "api.request.failed", error = %e, "Request did not complete");
        })?;
        Self::handle_response(response, self.locale).await
    }

    /// Translate a response into a [`Reply`] or an [`ApiError::Status`].
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
        locale: Locale,
    ) -> Result<Reply<T>> {
        let status = response.status();
        let url = response.url().path().to_string();

        if status == StatusCode::NO_CONTENT {
            return Ok(Reply::NoContent);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = status_error(status, &body, locale);
            warn!(
                name: "api.response.error",
                status = status.as_u16(),
                path = %url,
                "Server rejected request"
            );
            return Err(err);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Reply::Absent);
        }

        match serde_json::from_str::<T>(&body) {
            Ok(value) => Ok(Reply::Data(value)),
            Err(e) => {
                warn!(
                    name: "api.response.undecodable",
                    path = %url,
                    error = %e,
                    "Response body did not match the expected shape"
                );
                Ok(Reply::Absent)
            }
        }
    }
}

/// Build the error for a non-success status.
///
/// The server's `message` wins; then a known `code`; then the fixed fallback.
pub(crate) fn status_error(status: StatusCode, body: &str, locale: Locale) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = parsed
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            parsed
                .code
                .as_deref()
                .and_then(MessageKey::from_code)
                .map(|key| key.text(locale).to_string())
        })
        .unwrap_or_else(|| MessageKey::RequestFailed.text(locale).to_string());

    ApiError::Status {
        status: status.as_u16(),
        message,
        code: parsed.code,
    }
}

// =============================================================================
// Auth API
// =============================================================================

/// Auth API client.
#[derive(Debug)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl AuthApi<'_> {
    /// Create an account. A returned session becomes the current session.
    pub async fn register(&self, req: RegisterRequest) -> Result<Reply<AuthSession>> {
        let reply = self
            .client
            .post(&["api", "auth", "register"], Some(&req), Auth::Public)
            .await?;
        Ok(self.adopt(reply))
    }

    /// Log in with email and password. A returned session becomes current.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Reply<AuthSession>> {
        let req = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        let reply = self
            .client
            .post(&["api", "auth", "login"], Some(&req), Auth::Public)
            .await?;
        Ok(self.adopt(reply))
    }

    /// Revoke the token server-side, then clear the local session.
    pub async fn logout(&self) -> Result<()> {
        let _: Reply<serde_json::Value> = self
            .client
            .post::<(), _>(&["api", "auth", "logout"], None, Auth::Required)
            .await?;
        self.client.session.clear();
        Ok(())
    }

    fn adopt(&self, reply: Reply<AuthSession>) -> Reply<AuthSession> {
        if let Reply::Data(session) = &reply {
            self.client.session.set_session(Some(session.clone()));
        }
        reply
    }
}

// =============================================================================
// Pets API
// =============================================================================

/// Pets API client.
#[derive(Debug)]
pub struct PetsApi<'a> {
    client: &'a ApiClient,
}

impl PetsApi<'_> {
    /// List open pets.
    pub async fn list(&self) -> Result<Reply<Vec<PetCard>>> {
        self.client.get(&["api", "pets"], Auth::Public).await
    }

    /// Get a pet by ID.
    pub async fn get(&self, id: &str) -> Result<Reply<PetDetail>> {
        self.client
            .get(&["api", "pets", id], Auth::Public)
            .await
    }

    /// Publish a pet for rehoming. The signed-in user becomes its owner.
    pub async fn create(&self, req: &CreatePetRequest) -> Result<Reply<PetCard>> {
        self.client
            .post(&["api", "pets"], Some(req), Auth::Required)
            .await
    }

    /// Upload a photo; the returned URL goes into the pet listing.
    pub async fn upload_image(
        &self,
        file_name: impl Into<String>,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Reply<UploadedImage>> {
        let part = Part::bytes(bytes)
            .file_name(file_name.into())
            .mime_str(mime_type)?;
        let rb = self
            .client
            .request(Method::POST, &["api", "pets", "upload"], Auth::Required)?
            .multipart(Form::new().part("file", part));
        self.client.execute(rb).await
    }

    /// Suggest personality tags for a free-text description.
    pub async fn personality_tags(&self, text: &str) -> Result<Reply<PersonalityTags>> {
        let req = PersonalityTagsRequest {
            text: text.trim().to_string(),
        };
        self.client
            .post(&["api", "pets", "personality-tags"], Some(&req), Auth::Public)
            .await
    }
}

// =============================================================================
// Users API
// =============================================================================

/// User profile API client.
#[derive(Debug)]
pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl UsersApi<'_> {
    /// Public profile, including the user's listed pets.
    pub async fn get(&self, id: i64) -> Result<Reply<UserProfile>> {
        let id = id.to_string();
        self.client
            .get(&["api", "users", id.as_str()], Auth::Public)
            .await
    }
}

// =============================================================================
// Threads API
// =============================================================================

/// Direct-message threads API client. Every call needs a session.
#[derive(Debug)]
pub struct ThreadsApi<'a> {
    client: &'a ApiClient,
}

impl ThreadsApi<'_> {
    /// List the user's threads.
    pub async fn list(&self) -> Result<Reply<Vec<ChatThread>>> {
        self.client.get(&["api", "threads"], Auth::Required).await
    }

    /// Get one thread with its messages.
    pub async fn get(&self, thread_id: &str) -> Result<Reply<ChatThread>> {
        self.client
            .get(&["api", "threads", thread_id], Auth::Required)
            .await
    }

    /// Open (or reuse) a thread with a pet's owner.
    pub async fn create(&self, owner_id: i64, pet_id: i64) -> Result<Reply<ChatThread>> {
        let req = CreateThreadRequest { owner_id, pet_id };
        self.client
            .post(&["api", "threads"], Some(&req), Auth::Required)
            .await
    }

    /// Post a message.
    pub async fn send_message(
        &self,
        thread_id: &str,
        text: impl Into<String>,
    ) -> Result<Reply<ChatMessage>> {
        let req = SendMessageRequest { text: text.into() };
        self.client
            .post(
                &["api", "threads", thread_id, "messages"],
                Some(&req),
                Auth::Required,
            )
            .await
    }

    /// Ask the owner to start the adoption process.
    pub async fn request_adoption(&self, thread_id: &str) -> Result<Reply<ChatThread>> {
        self.client
            .post::<(), _>(
                &["api", "threads", thread_id, "adoption"],
                None,
                Auth::Required,
            )
            .await
    }

    /// Owner accepts the adoption request.
    pub async fn accept_adoption(&self, thread_id: &str) -> Result<Reply<ChatThread>> {
        self.client
            .post::<(), _>(
                &["api", "threads", thread_id, "adoption", "accept"],
                None,
                Auth::Required,
            )
            .await
    }
}

// =============================================================================
// Adoptions API
// =============================================================================

/// Adoptions API client.
#[derive(Debug)]
pub struct AdoptionsApi<'a> {
    client: &'a ApiClient,
}

impl AdoptionsApi<'_> {
    /// The user's adoption processes, newest first.
    pub async fn list(&self) -> Result<Reply<Vec<AdoptionSummary>>> {
        self.client.get(&["api", "adoptions"], Auth::Required).await
    }
}

// =============================================================================
// Home API
// =============================================================================

/// Home feed API client.
#[derive(Debug)]
pub struct HomeApi<'a> {
    client: &'a ApiClient,
}

impl HomeApi<'_> {
    /// Open pets plus the update and guide cards.
    pub async fn feed(&self) -> Result<Reply<HomeFeed>> {
        self.client.get(&["api", "home"], Auth::Public).await
    }

    /// Post an update or guide card.
    pub async fn create_content(&self, req: &CreateContentRequest) -> Result<Reply<HomeContent>> {
        self.client
            .post(&["api", "home", "content"], Some(req), Auth::Required)
            .await
    }
}

// =============================================================================
// Agent API
// =============================================================================

/// Matching agent API client.
#[derive(Debug)]
pub struct AgentApi<'a> {
    client: &'a ApiClient,
}

impl AgentApi<'_> {
    /// Judge whether the interview so far is enough to recommend.
    pub async fn evaluate(&self, messages: &[AgentMessage]) -> Result<Reply<Evaluation>> {
        let req = EvaluationRequest { messages };
        self.client
            .post(&["api", "agent", "evaluate"], Some(&req), Auth::Public)
            .await
    }

    /// Rank candidate pets for the interviewed user.
    pub async fn recommend(&self, req: &RecommendationRequest) -> Result<Reply<Recommendation>> {
        self.client
            .post(&["api", "agent", "recommend"], Some(req), Auth::Public)
            .await
    }
}
