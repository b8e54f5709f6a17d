//! Assistant reply streaming over server-sent events.
//!
//! `POST /api/chat/stream` answers with `text/event-stream` frames whose
//! `data:` payload is `{"content": "...", "done": false}`. The final frame
//! carries `"done": true`.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::Method;
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{
    client::{ApiClient, Auth, status_error},
    error::{ApiError, Result},
    types::{AssistantRequest, StreamChunk},
};

/// One step of an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantEvent {
    /// Text to append to the reply.
    Delta(String),
    /// The reply is complete.
    Done,
}

/// Boxed stream of assistant events.
pub type AssistantStream = Pin<Box<dyn Stream<Item = Result<AssistantEvent>> + Send>>;

impl ApiClient {
    /// Access the AI assistant API.
    pub fn assistant(&self) -> AssistantApi<'_> {
        AssistantApi { client: self }
    }
}

/// AI assistant API client.
#[derive(Debug)]
pub struct AssistantApi<'a> {
    client: &'a ApiClient,
}

impl AssistantApi<'_> {
    /// Start streaming a reply to `message`.
    ///
    /// The stream ends after [`AssistantEvent::Done`]. Cancelling `cancel`
    /// ends it with [`ApiError::Cancelled`]; a connection that closes before
    /// `done` ends it with [`ApiError::StreamEnded`].
    pub async fn stream(
        &self,
        message: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<AssistantStream> {
        let req = AssistantRequest {
            message: message.into(),
        };
        let rb = self
            .client
            .request(Method::POST, &["api", "chat", "stream"], Auth::Public)?
            .header(ACCEPT, "text/event-stream")
            .timeout(self.client.stream_timeout())
            .json(&req);

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
            response = rb.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                name: "assistant.stream.rejected",
                status = status.as_u16(),
                "Stream request rejected"
            );
            return Err(status_error(status, &body, self.client.locale()));
        }

        debug!(name: "assistant.stream.opened", "Assistant stream opened");
        Ok(Box::pin(parse_event_stream(response.bytes_stream(), cancel)))
    }

    /// Stream a reply and return the concatenated text.
    pub async fn ask(&self, message: impl Into<String>, cancel: CancellationToken) -> Result<String> {
        let mut stream = self.stream(message, cancel).await?;
        let mut reply = String::new();
        while let Some(event) = stream.next().await {
            match event? {
                AssistantEvent::Delta(text) => reply.push_str(&text),
                AssistantEvent::Done => break,
            }
        }
        Ok(reply)
    }
}

/// Turn raw SSE bytes into assistant events.
pub(crate) fn parse_event_stream<S, B, E>(
    byte_stream: S,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<AssistantEvent>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<ApiError> + Send,
{
    async_stream::try_stream! {
        let mut buf = Vec::<u8>::new();

        futures::pin_mut!(byte_stream);
        'read: loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                next = byte_stream.next() => Some(next),
            };
            let Some(next) = next else {
                debug!(name: "assistant.stream.cancelled", "Assistant stream cancelled");
                Err::<(), _>(ApiError::Cancelled)?;
                break 'read;
            };
            let Some(chunk) = next else {
                Err::<(), _>(ApiError::StreamEnded)?;
                break 'read;
            };
            let chunk = chunk.map_err(Into::into)?;
            buf.extend_from_slice(chunk.as_ref());

            while let Some((pos, sep_len)) = find_frame_end(&buf) {
                let frame = buf.drain(..pos + sep_len).collect::<Vec<_>>();
                let text = String::from_utf8_lossy(&frame[..pos]);

                for event in parse_frame(&text)? {
                    let done = event == AssistantEvent::Done;
                    yield event;
                    if done {
                        break 'read;
                    }
                }
            }
        }
    }
}

/// Position and length of the first blank-line frame separator.
fn find_frame_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Decode one SSE frame.
fn parse_frame(frame: &str) -> Result<Vec<AssistantEvent>> {
    let mut event_name = None;
    let mut data = Vec::new();

    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(value) = line.strip_prefix("event:") {
            event_name = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    let data = data.join("\n");

    if event_name == Some("error") {
        let message = if data.trim().is_empty() {
            "stream error".to_string()
        } else {
            data
        };
        return Err(ApiError::Stream(message));
    }
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }

    let Ok(chunk) = serde_json::from_str::<StreamChunk>(&data) else {
        debug!(name: "assistant.stream.skipped", "Skipping undecodable frame");
        return Ok(Vec::new());
    };

    let mut events = Vec::new();
    if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
        events.push(AssistantEvent::Delta(content));
    }
    if chunk.done {
        events.push(AssistantEvent::Done);
    }
    Ok(events)
}
