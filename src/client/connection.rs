use crate::types::{OutboundMessage, Result, SyncError};
use futures::stream::SplitSink;
use futures::SinkExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Lifecycle state of the single logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel open; automatic reconnection may be pending
    Disconnected,
    /// Channel handshake in progress
    Connecting,
    /// Channel open; sends transmit immediately
    Connected,
    /// Automatic retries exhausted; sends queue locally until a manual
    /// `connect()` resets the attempt counter
    OfflineFallback,
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Owns the write half of the WebSocket and the current [`ConnectionState`].
pub struct ConnectionManager {
    ws_write: Arc<RwLock<Option<WsSink>>>,
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            ws_write: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Sets the WebSocket write sink (called after a successful handshake)
    pub async fn set_writer(&self, writer: WsSink) {
        let mut ws = self.ws_write.write().await;
        *ws = Some(writer);
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.write().await;
        *state = new_state;
    }

    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Writes a message frame to the channel.
    ///
    /// Fails when there is no live writer or the write itself errors; the
    /// caller decides whether that means queuing.
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;

        let mut ws_guard = self.ws_write.write().await;
        match ws_guard.as_mut() {
            Some(ws) => {
                ws.send(Message::Text(json)).await?;
                Ok(())
            }
            None => Err(SyncError::Connection("no active channel".to_string())),
        }
    }

    /// Closes the channel gracefully and drops the writer.
    pub async fn close(&self) -> Result<()> {
        let mut ws_guard = self.ws_write.write().await;
        if let Some(ws) = ws_guard.as_mut() {
            ws.close().await?;
        }
        *ws_guard = None;
        Ok(())
    }

    /// Drops the writer without the close handshake (used when the read side
    /// already observed the channel going away).
    pub async fn clear_writer(&self) {
        let mut ws = self.ws_write.write().await;
        *ws = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
