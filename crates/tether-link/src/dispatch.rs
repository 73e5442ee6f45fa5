//! Inbound frame routing.
//!
//! The dispatcher is the sole consumer of the event loop's inbound queue.
//! Frames are processed strictly in receive order; every failure mode short
//! of an epoch error is log-and-continue, so one bad frame never takes the
//! channel down.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tether_core::{InboundMessage, PayloadKind};

use crate::hub::SessionHub;

/// Consume the inbound queue until it closes or the epoch is cancelled.
pub async fn run_dispatcher(
    hub: SessionHub,
    mut inbound: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("dispatcher cancelled");
                return;
            }
            frame = inbound.recv() => {
                let Some(frame) = frame else {
                    debug!("inbound queue closed, dispatcher exiting");
                    return;
                };
                dispatch_frame(&hub, &frame).await;
            }
        }
    }
}

async fn dispatch_frame(hub: &SessionHub, frame: &str) {
    let message: InboundMessage = match serde_json::from_str(frame) {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, "failed to decode inbound frame");
            return;
        }
    };

    let Some(kind) = PayloadKind::parse(&message.payload.kind) else {
        warn!(kind = %message.payload.kind, "unknown payload type");
        return;
    };

    let session_id = message.session_id;
    let Some(session) = hub.get(session_id).await else {
        warn!(session_id = %session_id, "no session for inbound frame");
        return;
    };

    match kind {
        PayloadKind::Close => {
            info!(session_id = %session_id, "session closed by remote");
            hub.delete(session_id).await;
        }
        PayloadKind::Response => {
            // Blocks until the session consumes; the one-slot session queue
            // is the backpressure between remote and handler.
            if !session.deliver(message.payload.content).await {
                warn!(session_id = %session_id, "session exited before delivery");
            }
        }
        PayloadKind::Instruction => {
            // Remote-initiated instruction dispatch is reserved; the routing
            // slot exists but no contract binds it to the registry yet.
            debug!(session_id = %session_id, "dropping inbound instruction frame");
        }
        PayloadKind::Event => {
            warn!(session_id = %session_id, "unexpected event frame from remote");
        }
    }
}
