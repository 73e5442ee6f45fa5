//! The connection supervisor: one authenticate → dial → serve → teardown
//! cycle per iteration, forever, until the root token cancels.
//!
//! Identity retry is unbounded; a failing control plane never crashes the
//! bot. Any transport failure mid-epoch tears the epoch down, waits the
//! reconnect delay, and starts over from authentication.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tether_ident::{authenticate, IdentClient, IdentityStore};

use crate::dispatch::run_dispatcher;
use crate::error::TransportError;
use crate::event_loop::{run_recv_pump, run_send_pump, QUEUE_CAPACITY};
use crate::hub::SessionHub;
use crate::registry::Registries;
use crate::transport::{self, FrameSink, FrameSource};

const AUTH_RETRY_DELAY: Duration = Duration::from_secs(2);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// How an epoch ended.
enum EpochEnd {
    /// Root cancellation: shut down the process.
    Shutdown,
    /// Transport failure: back off and reconnect.
    Failed(TransportError),
}

/// Owns the reconnect/auth loop and the lifecycle of every epoch.
pub struct Supervisor {
    websocket_url: String,
    store: Arc<IdentityStore>,
    client: IdentClient,
    registries: Arc<Registries>,
}

impl Supervisor {
    pub fn new(
        websocket_url: impl Into<String>,
        store: Arc<IdentityStore>,
        client: IdentClient,
        registries: Arc<Registries>,
    ) -> Self {
        Self {
            websocket_url: websocket_url.into(),
            store,
            client,
            registries,
        }
    }

    /// Run until root cancellation.
    pub async fn run(&self, root: CancellationToken) {
        loop {
            let Some(robot_id) = self.acquire_identity(&root).await else {
                info!("shutdown requested during authentication");
                return;
            };

            if root.is_cancelled() {
                info!("shutdown requested before connection");
                return;
            }

            let url = format!("{}/{robot_id}", self.websocket_url);
            let (sink, source) = match transport::connect(&url, DIAL_TIMEOUT).await {
                Ok(halves) => halves,
                Err(e) => {
                    warn!(error = %e, retry_in = ?RECONNECT_DELAY, "failed to connect, restarting from authentication");
                    if !wait_for_retry(&root, RECONNECT_DELAY).await {
                        info!("shutdown requested during reconnect wait");
                        return;
                    }
                    continue;
                }
            };
            info!(url, "connected to control channel");

            match self.serve(&root, robot_id, sink, source).await {
                EpochEnd::Shutdown => {
                    info!("shutdown signal received");
                    return;
                }
                EpochEnd::Failed(e) => {
                    warn!(error = %e, "connection lost, restarting from authentication");
                }
            }

            if !wait_for_retry(&root, RECONNECT_DELAY).await {
                info!("shutdown requested during reconnect wait");
                return;
            }
        }
    }

    /// Authenticate with unbounded retry. `None` when the root cancels.
    async fn acquire_identity(&self, root: &CancellationToken) -> Option<Uuid> {
        loop {
            if root.is_cancelled() {
                return None;
            }
            match authenticate(&self.store, &self.client).await {
                Ok(robot_id) => {
                    info!(robot_id = %robot_id, "robot authenticated");
                    return Some(robot_id);
                }
                Err(e) => {
                    warn!(error = %e, retry_in = ?AUTH_RETRY_DELAY, "authentication failed, retrying");
                    if !wait_for_retry(root, AUTH_RETRY_DELAY).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Serve one epoch: start pumps and dispatcher, seed auto-start
    /// emitters, then block until root cancellation or the first transport
    /// error. Teardown cancels the epoch token, which closes the transport
    /// (via the send pump) and stops every session.
    async fn serve<S, R>(
        &self,
        root: &CancellationToken,
        robot_id: Uuid,
        sink: S,
        source: R,
    ) -> EpochEnd
    where
        S: FrameSink + 'static,
        R: FrameSource + 'static,
    {
        let conn = root.child_token();
        let (outbound_tx, outbound_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (err_tx, mut err_rx) = mpsc::channel(1);

        let send_pump = tokio::spawn(run_send_pump(
            sink,
            outbound_rx,
            conn.clone(),
            err_tx.clone(),
        ));
        let recv_pump = tokio::spawn(run_recv_pump(source, inbound_tx, conn.clone(), err_tx));

        let hub = SessionHub::new(robot_id, outbound_tx, conn.clone());
        let dispatcher = tokio::spawn(run_dispatcher(hub.clone(), inbound_rx, conn.clone()));
        info!("event loop started");

        for emitter in self.registries.auto_start() {
            let session_id = hub.new_session(&emitter.action).await;
            debug!(emitter = emitter.name, session_id = %session_id, "emitter started");
        }

        let end = tokio::select! {
            () = root.cancelled() => EpochEnd::Shutdown,
            err = err_rx.recv() => match err {
                Some(e) => EpochEnd::Failed(e),
                // Both pumps exited without reporting; treat as a closed
                // connection.
                None => EpochEnd::Failed(TransportError::Closed),
            },
        };

        conn.cancel();
        let _ = tokio::join!(send_pump, recv_pump, dispatcher);
        end
    }
}

/// Sleep for `delay` unless the root cancels first. `true` means retry.
async fn wait_for_retry(root: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        () = root.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
