//! The heartbeat emitter.
//!
//! On start it announces itself with one `heartbeat` event, then sends an
//! empty `response` frame every five seconds. Responses the remote sends
//! back on this session are decoded and logged. Exits on cancellation or
//! when its inbound queue closes.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;
use tokio::time::{interval_at, Instant};
use tracing::debug;

use tether_core::OutboundMessage;

use crate::action::{decode, SessionAction, SessionCtx};

/// Wire name of the heartbeat event.
pub const HEARTBEAT_EVENT: &str = "heartbeat";

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Body of a heartbeat acknowledgement from the remote.
#[derive(Debug, Default, Deserialize)]
pub struct HeartbeatReply {}

/// Build the heartbeat session action.
pub fn emitter() -> SessionAction {
    Arc::new(|mut ctx: SessionCtx| {
        async move {
            let hello = OutboundMessage::event(ctx.session_id, HEARTBEAT_EVENT, json!({}));
            if !ctx.send(hello).await {
                return;
            }

            let mut tick = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
            loop {
                tokio::select! {
                    () = ctx.cancel.cancelled() => return,
                    _ = tick.tick() => {
                        let beat = OutboundMessage::response(ctx.session_id, json!({}));
                        if !ctx.send(beat).await {
                            return;
                        }
                    }
                    reply = ctx.inbound.recv() => {
                        let Some(content) = reply else { return };
                        if decode::<HeartbeatReply>(&content).is_ok() {
                            debug!(session_id = %ctx.session_id, "received heartbeat response");
                        }
                    }
                }
            }
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use tether_core::{RawContent, SessionId};

    fn heartbeat_ctx(
        cancel: CancellationToken,
    ) -> (
        SessionCtx,
        mpsc::Sender<RawContent>,
        mpsc::Receiver<OutboundMessage>,
    ) {
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, out_rx) = mpsc::channel(10);
        let ctx = SessionCtx {
            session_id: SessionId::new(),
            robot_id: Uuid::now_v7(),
            inbound: in_rx,
            outbound: out_tx,
            cancel,
        };
        (ctx, in_tx, out_rx)
    }

    fn payload_type(msg: &OutboundMessage) -> String {
        serde_json::to_value(msg).unwrap()["payload"]["type"]
            .as_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test(start_paused = true)]
    async fn announces_event_immediately() {
        let (ctx, _in_tx, mut out_rx) = heartbeat_ctx(CancellationToken::new());
        let session_id = ctx.session_id;
        let _task = tokio::spawn(emitter()(ctx));

        let first = out_rx.recv().await.unwrap();
        assert_eq!(first.session_id, session_id);
        let value = serde_json::to_value(&first).unwrap();
        assert_eq!(value["payload"]["type"], "event");
        assert_eq!(value["payload"]["content"]["event"], "heartbeat");
        assert_eq!(value["payload"]["content"]["detail"], serde_json::json!({}));
    }

    #[tokio::test(start_paused = true)]
    async fn beats_every_five_seconds() {
        let (ctx, _in_tx, mut out_rx) = heartbeat_ctx(CancellationToken::new());
        let session_id = ctx.session_id;
        let _task = tokio::spawn(emitter()(ctx));

        let first = out_rx.recv().await.unwrap();
        assert_eq!(payload_type(&first), "event");

        // Nothing more until the clock moves.
        assert!(out_rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(5)).await;
        let beat = out_rx.recv().await.unwrap();
        assert_eq!(payload_type(&beat), "response");
        assert_eq!(beat.session_id, session_id);

        tokio::time::advance(Duration::from_secs(5)).await;
        let beat = out_rx.recv().await.unwrap();
        assert_eq!(payload_type(&beat), "response");
    }

    #[tokio::test(start_paused = true)]
    async fn consumes_inbound_replies_and_keeps_beating() {
        let (ctx, in_tx, mut out_rx) = heartbeat_ctx(CancellationToken::new());
        let _task = tokio::spawn(emitter()(ctx));

        let _ = out_rx.recv().await.unwrap();
        let reply = serde_json::value::RawValue::from_string("{}".into()).unwrap();
        in_tx.send(Some(reply)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        let beat = out_rx.recv().await.unwrap();
        assert_eq!(payload_type(&beat), "response");
    }

    #[tokio::test(start_paused = true)]
    async fn exits_on_cancellation() {
        let cancel = CancellationToken::new();
        let (ctx, _in_tx, mut out_rx) = heartbeat_ctx(cancel.clone());
        let task = tokio::spawn(emitter()(ctx));

        let _ = out_rx.recv().await.unwrap();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("emitter should exit promptly")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_inbound_queue_closes() {
        let (ctx, in_tx, mut out_rx) = heartbeat_ctx(CancellationToken::new());
        let task = tokio::spawn(emitter()(ctx));

        let _ = out_rx.recv().await.unwrap();
        drop(in_tx);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("emitter should exit when queue closes")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_reply_is_ignored() {
        let (ctx, in_tx, mut out_rx) = heartbeat_ctx(CancellationToken::new());
        let _task = tokio::spawn(emitter()(ctx));

        let _ = out_rx.recv().await.unwrap();
        let bad = serde_json::value::RawValue::from_string("[1,2,3]".into()).unwrap();
        in_tx.send(Some(bad)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(payload_type(&out_rx.recv().await.unwrap()), "response");
    }
}
