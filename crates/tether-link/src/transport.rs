//! Transport adapter: a duplex JSON frame channel over a WebSocket.
//!
//! The adapter is two halves behind trait seams so the pumps can be driven
//! against in-memory fakes in tests. The real halves wrap the split sink and
//! stream of a `tokio-tungstenite` connection. The adapter does not buffer
//! and does not frame-split; the WebSocket is message-oriented.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use tether_core::OutboundMessage;

use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the frame channel.
#[async_trait]
pub trait FrameSink: Send {
    /// Serialize `frame` and write it as one text frame.
    async fn send_json(&mut self, frame: &OutboundMessage) -> Result<(), TransportError>;

    /// Best-effort close with a normal-closure code.
    async fn close(&mut self, reason: &str);
}

/// Read half of the frame channel.
#[async_trait]
pub trait FrameSource: Send {
    /// Read one frame and return its raw text without decoding.
    async fn recv_json(&mut self) -> Result<String, TransportError>;
}

/// Open a WebSocket connection, bounded by `timeout`.
pub async fn connect(
    url: &str,
    timeout: Duration,
) -> Result<(WsSink, WsSource), TransportError> {
    let (ws, _) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .map_err(|_| TransportError::DialTimeout(timeout))??;
    let (tx, rx) = ws.split();
    Ok((WsSink { tx }, WsSource { rx }))
}

/// WebSocket-backed [`FrameSink`].
#[derive(Debug)]
pub struct WsSink {
    tx: SplitSink<WsStream, Message>,
}

/// WebSocket-backed [`FrameSource`].
#[derive(Debug)]
pub struct WsSource {
    rx: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_json(&mut self, frame: &OutboundMessage) -> Result<(), TransportError> {
        let text = serde_json::to_string(frame)?;
        self.tx.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_owned().into(),
        };
        let _ = self.tx.send(Message::Close(Some(frame))).await;
    }
}

#[async_trait]
impl FrameSource for WsSource {
    async fn recv_json(&mut self) -> Result<String, TransportError> {
        loop {
            match self.rx.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => return Ok(text.to_owned()),
                    Err(_) => {
                        debug!(len = data.len(), "dropping non-UTF8 binary frame");
                    }
                },
                Some(Ok(Message::Close(_))) => return Err(TransportError::Closed),
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(TransportError::Closed),
            }
        }
    }
}
