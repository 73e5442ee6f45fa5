//! The event loop: two independent pumps decoupling I/O from processing.
//!
//! The send pump drains the shared outbound queue into the transport; the
//! receive pump feeds raw inbound frames to the dispatcher. Both queues are
//! bounded at [`QUEUE_CAPACITY`], so producers block when the other side
//! lags. Any I/O failure is fatal to the epoch: the failing pump reports it
//! once on a single-slot error channel and exits, and the supervisor tears
//! everything down.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use tether_core::OutboundMessage;

use crate::error::TransportError;
use crate::transport::{FrameSink, FrameSource};

/// Capacity of the outbound and inbound event-loop queues.
pub const QUEUE_CAPACITY: usize = 10;

/// Drain the outbound queue into the transport, in FIFO order across all
/// producers.
///
/// Exits when the queue closes, the epoch is cancelled (in-flight frames may
/// be dropped), or a send fails. The transport is closed with a normal
/// closure on every exit path.
pub async fn run_send_pump<S: FrameSink>(
    mut sink: S,
    mut outbound: mpsc::Receiver<OutboundMessage>,
    cancel: CancellationToken,
    errors: mpsc::Sender<TransportError>,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("send pump cancelled");
                break;
            }
            msg = outbound.recv() => {
                let Some(msg) = msg else {
                    debug!("outbound queue closed");
                    break;
                };
                if let Err(e) = sink.send_json(&msg).await {
                    if !cancel.is_cancelled() {
                        error!(error = %e, "failed to send frame");
                        let _ = errors.try_send(e);
                    }
                    break;
                }
            }
        }
    }
    sink.close("shutting down").await;
}

/// Read frames from the transport into the inbound queue, in receive order.
///
/// Exits when the epoch is cancelled, the dispatcher goes away, or a receive
/// fails. Dropping the inbound sender on exit closes the dispatcher's queue.
pub async fn run_recv_pump<R: FrameSource>(
    mut source: R,
    inbound: mpsc::Sender<String>,
    cancel: CancellationToken,
    errors: mpsc::Sender<TransportError>,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("receive pump cancelled");
                return;
            }
            frame = source.recv_json() => {
                match frame {
                    Ok(frame) => {
                        tokio::select! {
                            () = cancel.cancelled() => return,
                            sent = inbound.send(frame) => {
                                if sent.is_err() {
                                    debug!("dispatcher gone, receive pump exiting");
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        if !cancel.is_cancelled() {
                            error!(error = %e, "failed to receive frame");
                            let _ = errors.try_send(e);
                        }
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tether_core::SessionId;

    /// Sink that records serialized frames, optionally failing after a count.
    struct RecordingSink {
        frames: Arc<Mutex<Vec<String>>>,
        closed: Arc<Mutex<bool>>,
        fail_after: Option<usize>,
    }

    impl RecordingSink {
        fn new() -> (Self, Arc<Mutex<Vec<String>>>, Arc<Mutex<bool>>) {
            let frames = Arc::new(Mutex::new(Vec::new()));
            let closed = Arc::new(Mutex::new(false));
            (
                Self {
                    frames: frames.clone(),
                    closed: closed.clone(),
                    fail_after: None,
                },
                frames,
                closed,
            )
        }

        fn failing_after(limit: usize) -> Self {
            let (mut sink, _, _) = Self::new();
            sink.fail_after = Some(limit);
            sink
        }
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send_json(&mut self, frame: &OutboundMessage) -> Result<(), TransportError> {
            if let Some(limit) = self.fail_after {
                if self.frames.lock().unwrap().len() >= limit {
                    return Err(TransportError::Closed);
                }
            }
            self.frames
                .lock()
                .unwrap()
                .push(serde_json::to_string(frame)?);
            Ok(())
        }

        async fn close(&mut self, _reason: &str) {
            *self.closed.lock().unwrap() = true;
        }
    }

    /// Source that yields scripted frames, then an error.
    struct ScriptedSource {
        frames: VecDeque<String>,
    }

    #[async_trait]
    impl FrameSource for ScriptedSource {
        async fn recv_json(&mut self) -> Result<String, TransportError> {
            match self.frames.pop_front() {
                Some(frame) => Ok(frame),
                None => Err(TransportError::Closed),
            }
        }
    }

    /// Source that never yields.
    struct PendingSource;

    #[async_trait]
    impl FrameSource for PendingSource {
        async fn recv_json(&mut self) -> Result<String, TransportError> {
            futures::future::pending().await
        }
    }

    fn outbound(n: i64) -> OutboundMessage {
        OutboundMessage::response(SessionId::new(), json!({"n": n}))
    }

    #[tokio::test]
    async fn send_pump_writes_in_fifo_order() {
        let (sink, frames, _) = RecordingSink::new();
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (err_tx, _err_rx) = mpsc::channel(1);

        for i in 0..5 {
            tx.send(outbound(i)).await.unwrap();
        }
        drop(tx);
        run_send_pump(sink, rx, CancellationToken::new(), err_tx).await;

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            let value: serde_json::Value = serde_json::from_str(frame).unwrap();
            assert_eq!(value["payload"]["content"]["n"], i);
        }
    }

    #[tokio::test]
    async fn send_pump_closes_transport_on_exit() {
        let (sink, _, closed) = RecordingSink::new();
        let (tx, rx) = mpsc::channel::<OutboundMessage>(QUEUE_CAPACITY);
        let (err_tx, _err_rx) = mpsc::channel(1);
        drop(tx);
        run_send_pump(sink, rx, CancellationToken::new(), err_tx).await;
        assert!(*closed.lock().unwrap());
    }

    #[tokio::test]
    async fn send_pump_reports_failure_once() {
        let sink = RecordingSink::failing_after(1);
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (err_tx, mut err_rx) = mpsc::channel(1);

        tx.send(outbound(0)).await.unwrap();
        tx.send(outbound(1)).await.unwrap();
        let pump = tokio::spawn(run_send_pump(sink, rx, CancellationToken::new(), err_tx));

        let err = err_rx.recv().await.unwrap();
        assert!(matches!(err, TransportError::Closed));
        pump.await.unwrap();
        // The error channel closed without a second report.
        assert!(err_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn send_pump_exits_on_cancellation() {
        let (sink, frames, _) = RecordingSink::new();
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (err_tx, mut err_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let pump = tokio::spawn(run_send_pump(sink, rx, cancel.clone(), err_tx));
        cancel.cancel();
        pump.await.unwrap();

        // Cancellation is not an error and nothing was sent.
        assert!(err_rx.recv().await.is_none());
        assert!(frames.lock().unwrap().is_empty());
        drop(tx);
    }

    #[tokio::test]
    async fn recv_pump_delivers_in_receive_order() {
        let source = ScriptedSource {
            frames: (0..5).map(|i| format!("frame-{i}")).collect(),
        };
        let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
        let (err_tx, mut err_rx) = mpsc::channel(1);

        let pump = tokio::spawn(run_recv_pump(source, tx, CancellationToken::new(), err_tx));
        for i in 0..5 {
            assert_eq!(rx.recv().await.unwrap(), format!("frame-{i}"));
        }
        // The scripted source then errors, which is reported and fatal.
        let err = err_rx.recv().await.unwrap();
        assert!(matches!(err, TransportError::Closed));
        pump.await.unwrap();
    }

    #[tokio::test]
    async fn recv_pump_exits_on_cancellation_without_error() {
        let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
        let (err_tx, mut err_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let pump = tokio::spawn(run_recv_pump(PendingSource, tx, cancel.clone(), err_tx));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump should exit promptly")
            .unwrap();
        assert!(err_rx.recv().await.is_none());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn recv_pump_exits_when_dispatcher_drops() {
        let source = ScriptedSource {
            frames: VecDeque::from(["one".to_string(), "two".to_string()]),
        };
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (err_tx, _err_rx) = mpsc::channel(1);
        drop(rx);
        run_recv_pump(source, tx, CancellationToken::new(), err_tx).await;
    }

    #[tokio::test]
    async fn error_slot_holds_only_the_first_error() {
        // Two pumps sharing one capacity-1 channel: the second report is
        // silently discarded by try_send.
        let (err_tx, mut err_rx) = mpsc::channel::<TransportError>(1);
        let _ = err_tx.try_send(TransportError::Closed);
        let _ = err_tx.try_send(TransportError::DialTimeout(Duration::from_secs(1)));
        drop(err_tx);

        assert!(matches!(err_rx.recv().await, Some(TransportError::Closed)));
        assert!(err_rx.recv().await.is_none());
    }
}
