//! The session hub: registry of live sessions and their driver tasks.
//!
//! The hub exclusively owns the session map. Each session gets a private
//! bounded handoff queue (capacity 1) written by the dispatcher and read by
//! the session task, plus a child cancellation token of the epoch. The map
//! entry is inserted before the task is spawned and removed when the task
//! exits for any reason, so the dispatcher never delivers to a session that
//! is already gone.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use tether_core::{OutboundMessage, RawContent, SessionId};

use crate::action::{SessionAction, SessionCtx};

/// Capacity of a session's private inbound queue. One slot is the smallest
/// bounded channel Rust offers; dispatcher sends still block until the
/// session consumes, which is the intended backpressure.
const SESSION_QUEUE_CAPACITY: usize = 1;

/// A live session as seen by the dispatcher.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: SessionId,
    inbound: mpsc::Sender<RawContent>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Deliver a raw payload to the session's inbound queue. Blocks until
    /// the session task consumes it; returns `false` when the task is gone.
    pub async fn deliver(&self, content: RawContent) -> bool {
        self.inbound.send(content).await.is_ok()
    }
}

/// Registry of live sessions for one connection epoch.
#[derive(Clone)]
pub struct SessionHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    robot_id: Uuid,
    outbound: mpsc::Sender<OutboundMessage>,
    cancel: CancellationToken,
}

impl SessionHub {
    /// Create a hub bound to this epoch's outbound queue and cancellation.
    pub fn new(
        robot_id: Uuid,
        outbound: mpsc::Sender<OutboundMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                sessions: RwLock::new(HashMap::new()),
                robot_id,
                outbound,
                cancel,
            }),
        }
    }

    /// Create a session with a fresh ID and spawn its driver task.
    pub async fn new_session(&self, action: &SessionAction) -> SessionId {
        self.new_session_with_id(SessionId::new(), action).await
    }

    /// Create a session under a caller-supplied ID. Used when the remote
    /// initiates the session.
    pub async fn new_session_with_id(
        &self,
        session_id: SessionId,
        action: &SessionAction,
    ) -> SessionId {
        let (inbound_tx, inbound_rx) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        let cancel = self.inner.cancel.child_token();
        let handle = SessionHandle {
            session_id,
            inbound: inbound_tx,
            cancel: cancel.clone(),
        };

        // Insert before spawning: dispatch must be able to find the session
        // the moment its task can run.
        {
            let mut sessions = self.inner.sessions.write().await;
            let _ = sessions.insert(session_id, handle);
        }

        let ctx = SessionCtx {
            session_id,
            robot_id: self.inner.robot_id,
            inbound: inbound_rx,
            outbound: self.inner.outbound.clone(),
            cancel,
        };
        let task = action(ctx);
        let inner = Arc::clone(&self.inner);
        let _ = tokio::spawn(async move {
            if AssertUnwindSafe(task).catch_unwind().await.is_err() {
                error!(session_id = %session_id, "session task panicked");
            }
            let mut sessions = inner.sessions.write().await;
            if sessions.remove(&session_id).is_some() {
                info!(session_id = %session_id, "session removed");
            }
        });

        session_id
    }

    /// Non-blocking lookup.
    pub async fn get(&self, session_id: SessionId) -> Option<SessionHandle> {
        self.inner.sessions.read().await.get(&session_id).cloned()
    }

    /// Remove a session and cancel its task. Dropping the map entry closes
    /// the session's inbound queue. Idempotent.
    pub async fn delete(&self, session_id: SessionId) {
        let handle = {
            let mut sessions = self.inner.sessions.write().await;
            sessions.remove(&session_id)
        };
        if let Some(handle) = handle {
            handle.cancel.cancel();
            info!(session_id = %session_id, "session deleted");
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    /// Whether the hub is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.sessions.read().await.is_empty()
    }
}
