//! Keeps the local [`ChatStore`] in step with the backend's threads.
//!
//! Each operation performs one request and mirrors the result into the
//! store. A cancelled operation returns [`ApiError::Cancelled`] and leaves
//! the store untouched, even if the response already arrived.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError, Reply, Result};
use crate::chat::{ChatMessage, ChatStore, ChatThread};

/// Backend-backed operations over a [`ChatStore`].
///
/// Cloning is cheap; clones share the store and the send lane.
#[derive(Debug, Clone)]
pub struct ThreadSync {
    client: ApiClient,
    store: ChatStore,
    /// Held for the whole of a send so appends land in call order.
    send_lane: Arc<Mutex<()>>,
}

impl ThreadSync {
    #[must_use]
    pub fn new(client: ApiClient, store: ChatStore) -> Self {
        Self {
            client,
            store,
            send_lane: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Mirror the server's thread list into the store.
    ///
    /// Server order comes first; threads only known locally are kept after
    /// them. An empty or undecodable body leaves the store as it was.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Vec<ChatThread>> {
        let reply = guarded(cancel, self.client.threads().list()).await?;
        match reply {
            Reply::Data(threads) => {
                info!(name: "sync.refreshed", count = threads.len(), "Threads refreshed");
                self.store.replace_all(threads);
            }
            Reply::NoContent | Reply::Absent => {
                debug!(name: "sync.refresh.empty", "Thread list had no body");
            }
        }
        Ok(self.store.threads())
    }

    /// Fetch one thread with its messages and mirror it.
    pub async fn open(
        &self,
        thread_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ChatThread>> {
        let reply = guarded(cancel, self.client.threads().get(thread_id)).await?;
        Ok(self.mirror(reply))
    }

    /// Open (or reuse) the thread with a pet's owner.
    pub async fn start(
        &self,
        counterpart_id: i64,
        subject_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<ChatThread>> {
        let reply = guarded(
            cancel,
            self.client.threads().create(counterpart_id, subject_id),
        )
        .await?;
        Ok(self.mirror(reply))
    }

    /// Post a message and append the server's copy.
    ///
    /// Text is trimmed first; blank text fails with
    /// [`ApiError::EmptyMessage`] without a request. Concurrent sends are
    /// appended in the order they were called.
    pub async fn send(
        &self,
        thread_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::EmptyMessage);
        }

        let _lane = guarded(cancel, async { Ok(self.send_lane.lock().await) }).await?;

        let reply = guarded(cancel, self.client.threads().send_message(thread_id, text)).await?;
        let Reply::Data(message) = reply else {
            debug!(name: "sync.send.no_body", thread_id, "Send returned no message");
            return Ok(None);
        };

        if let Some(appended) = self.store.append_remote(thread_id, message.clone()) {
            return Ok(Some(appended));
        }

        // Not mirrored yet; pull the whole thread, which includes the message.
        debug!(name: "sync.send.fetch_thread", thread_id, "Thread not local, fetching");
        match guarded(cancel, self.client.threads().get(thread_id)).await? {
            Reply::Data(thread) => {
                self.store.upsert_thread(thread);
                Ok(Some(message))
            }
            Reply::NoContent | Reply::Absent => Err(ApiError::ThreadNotFound(thread_id.to_string())),
        }
    }

    /// Ask the owner to start the adoption process.
    pub async fn request_adoption(
        &self,
        thread_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ChatThread>> {
        let reply = guarded(cancel, self.client.threads().request_adoption(thread_id)).await?;
        Ok(self.mirror(reply))
    }

    /// Accept a pending adoption request as the owner.
    pub async fn accept_adoption(
        &self,
        thread_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ChatThread>> {
        let reply = guarded(cancel, self.client.threads().accept_adoption(thread_id)).await?;
        Ok(self.mirror(reply))
    }

    fn mirror(&self, reply: Reply<ChatThread>) -> Option<ChatThread> {
        reply
            .into_option()
            .map(|thread| self.store.upsert_thread(thread))
    }
}

/// Run `fut` unless `cancel` fires first.
///
/// A result that is ready at the same moment as the cancellation is dropped.
async fn guarded<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ApiError::Cancelled),
        result = fut => {
            if cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
            result
        }
    }
}
