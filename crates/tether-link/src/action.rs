//! The session action framework.
//!
//! A session action drives one session task to completion. Handlers stay
//! oblivious to the wire envelope: they see only the decoded `content` of
//! the payloads addressed to their session, and everything they need (the
//! session ID, robot ID, queue handles, cancellation) arrives as one
//! explicit [`SessionCtx`] argument.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;
use uuid::Uuid;

use tether_core::{OutboundMessage, RawContent, SessionId};

/// Everything a session task may touch.
pub struct SessionCtx {
    /// This session's identifier; outbound frames carry it.
    pub session_id: SessionId,
    /// The robot identity the channel was dialed with.
    pub robot_id: Uuid,
    /// Receive half of the session's private inbound queue.
    pub inbound: mpsc::Receiver<RawContent>,
    /// Send half of the shared outbound queue.
    pub outbound: mpsc::Sender<OutboundMessage>,
    /// Cancelled when the session or its epoch is torn down.
    pub cancel: CancellationToken,
}

impl SessionCtx {
    /// Next inbound payload. `None` on queue close or cancellation.
    pub async fn recv(&mut self) -> Option<RawContent> {
        tokio::select! {
            () = self.cancel.cancelled() => None,
            msg = self.inbound.recv() => msg,
        }
    }

    /// Queue an outbound frame, blocking when the queue is full. Returns
    /// `false` when the session is cancelled or the epoch is gone; sessions
    /// never write past their cancellation.
    pub async fn send(&self, msg: OutboundMessage) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            () = self.cancel.cancelled() => false,
            sent = self.outbound.send(msg) => sent.is_ok(),
        }
    }
}

/// A reusable factory for session task futures. Stored in the handler
/// registries and invoked once per spawned session.
pub type SessionAction = Arc<dyn Fn(SessionCtx) -> BoxFuture<'static, ()> + Send + Sync>;

/// Decode raw payload content into a handler request type. Absent content
/// decodes like an empty document and fails for non-trivial types.
pub(crate) fn decode<T: DeserializeOwned>(content: &RawContent) -> serde_json::Result<T> {
    serde_json::from_str(content.as_deref().map_or("", RawValue::get))
}

/// Wrap a fire-and-forget handler: receive one payload, decode it, run the
/// handler for its side effects, exit. Decode failures are logged and
/// produce no outbound frame.
pub fn one_shot<T, F>(handler: F) -> SessionAction
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |mut ctx: SessionCtx| {
        let handler = Arc::clone(&handler);
        async move {
            let Some(content) = ctx.recv().await else {
                return;
            };
            match decode::<T>(&content) {
                Ok(request) => handler(request),
                Err(e) => {
                    error!(session_id = %ctx.session_id, error = %e, "failed to decode request");
                }
            }
        }
        .boxed()
    })
}

/// Wrap a request-response handler: receive one payload, decode it (absent
/// or `null` content yields the request type's default), compute the
/// response, and enqueue it as a `type: "response"` frame for this session.
pub fn request_response<T, O, F>(handler: F) -> SessionAction
where
    T: DeserializeOwned + Default + Send + 'static,
    O: Serialize + Send + 'static,
    F: Fn(T) -> O + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |mut ctx: SessionCtx| {
        let handler = Arc::clone(&handler);
        async move {
            let Some(content) = ctx.recv().await else {
                return;
            };
            let request = match content.as_deref() {
                None => T::default(),
                Some(raw) if raw.get() == "null" => T::default(),
                Some(raw) => match serde_json::from_str::<T>(raw.get()) {
                    Ok(request) => request,
                    Err(e) => {
                        error!(session_id = %ctx.session_id, error = %e, "failed to decode request");
                        return;
                    }
                },
            };

            let response = handler(request);
            let value = match serde_json::to_value(&response) {
                Ok(value) => value,
                Err(e) => {
                    error!(session_id = %ctx.session_id, error = %e, "failed to encode response");
                    return;
                }
            };
            let _ = ctx.send(OutboundMessage::response(ctx.session_id, value)).await;
        }
        .boxed()
    })
}
