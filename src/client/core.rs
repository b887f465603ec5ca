use super::{ClientState, ConnectionManager, ConnectionState, ProgressClientOptions};
use crate::coordinator::SyncCoordinator;
use crate::infrastructure::Backoff;
use crate::messaging::{InboundEvent, MessageDispatcher};
use crate::storage::ProfileStore;
use crate::types::constants::CHANNEL_PATH;
use crate::types::{OutboundMessage, Result};
use futures::stream::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio_tungstenite::connect_async;
use url::Url;

/// Client side of the realtime progress channel.
///
/// `ProgressClient` owns the single logical connection to the backend,
/// reconnects with exponential backoff when it drops, queues outbound
/// messages durably while offline, and replays them in order on reconnect.
/// Inbound pushes are decoded and routed to registered handlers at any time,
/// independent of the outbound state.
///
/// # Failure semantics
///
/// [`send`](Self::send) never fails: a message is either written to the live
/// channel or persisted in the pending queue. Delivery is at-most-once; the
/// channel protocol has no per-message acknowledgment, so "sent" only means
/// the channel was open when the frame was written.
///
/// # Example
///
/// ```no_run
/// use progress_realtime::{
///     FileStore, OutboundEvent, OutboundMessage, ProgressClientBuilder, ProgressClientOptions,
/// };
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(FileStore::new("./data")?);
/// let client = ProgressClientBuilder::new(
///     ProgressClientOptions {
///         host: "training.example.com".to_string(),
///         ..Default::default()
///     },
///     store,
/// )?
/// .build();
///
/// client.connect().await?;
///
/// let msg = OutboundMessage::new(
///     OutboundEvent::ChallengeProgress,
///     client.user_id(),
///     Default::default(),
/// );
/// client.send(msg).await; // transmitted or queued, never an error
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProgressClient {
    pub(crate) options: ProgressClientOptions,
    pub(crate) user_id: String,
    pub(crate) profile: ProfileStore,
    pub(crate) backoff: Backoff,
    pub(crate) connection: Arc<ConnectionManager>,
    pub(crate) coordinator: Arc<SyncCoordinator>,
    pub(crate) dispatcher: Arc<MessageDispatcher>,
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl ProgressClient {
    /// Establishes the channel connection.
    ///
    /// No-op while already Connecting or Connected. A manual call resets the
    /// reconnect attempt counter, so it also brings the client back from
    /// OfflineFallback. On open failure the error is returned to the caller,
    /// but the automatic retry path is scheduled regardless.
    pub async fn connect(&self) -> Result<()> {
        {
            let state = self.connection.state().await;
            if state == ConnectionState::Connected || state == ConnectionState::Connecting {
                return Ok(());
            }
        }

        {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = false;
            state.reconnect_attempts = 0;
        }

        self.try_connect().await
    }

    /// Single connection attempt; used by both `connect()` and the reconnect
    /// loop.
    pub(crate) async fn try_connect(&self) -> Result<()> {
        {
            let state = self.connection.state().await;
            if state == ConnectionState::Connected || state == ConnectionState::Connecting {
                return Ok(());
            }
        }

        let url = self.endpoint_url()?;
        self.set_state(ConnectionState::Connecting).await;
        tracing::info!("Connecting to {}", url);

        let mut ws_stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::error!("Channel open failed: {}", e);
                self.set_state(ConnectionState::Disconnected).await;
                return Err(e.into());
            }
        };

        // A manual disconnect can land while the handshake is in flight; it
        // wins over the fresh channel.
        if self.state.read().await.was_manual_disconnect {
            tracing::info!("Manual disconnect during handshake, dropping new channel");
            if let Err(e) = ws_stream.close(None).await {
                tracing::debug!("Error closing unused channel: {}", e);
            }
            self.set_state(ConnectionState::Disconnected).await;
            return Ok(());
        }

        let (write_half, mut read_half) = ws_stream.split();
        self.connection.set_writer(write_half).await;

        // Read task: decode inbound pushes and watch for the channel going away
        let self_cloned = self.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let read_task = tokio::spawn(async move {
            use tokio_tungstenite::tungstenite::Message;

            tracing::debug!("Starting read task");
            while let Some(msg_result) = read_half.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        tracing::debug!("Received text message: {}", text);
                        dispatcher.dispatch_text(&text);
                    }
                    Ok(Message::Close(frame)) => {
                        match frame {
                            Some(close_frame) => tracing::warn!(
                                "Server closed channel: code={:?}, reason='{}'",
                                close_frame.code,
                                close_frame.reason
                            ),
                            None => tracing::warn!("Server closed channel without close frame"),
                        }
                        break;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(other) => {
                        tracing::debug!("Ignoring non-text frame: {:?}", other);
                    }
                    Err(e) => {
                        tracing::error!("Channel read error: {}", e);
                        break;
                    }
                }
            }
            // Close frame, read error, or a stream that simply ended: the
            // channel is gone either way, so enter the retry path.
            self_cloned.handle_channel_loss().await;
            tracing::debug!("Read task finished");
        });
        self.state.write().await.track(read_task);

        // The Connected flip, the offline replay, and the presence
        // announcement happen under one drain guard, so a send racing the
        // connect cannot slip in ahead of older queued messages.
        self.coordinator
            .on_connected(
                &self.connection,
                OutboundMessage::connection_announcement(&self.user_id),
                self.set_state(ConnectionState::Connected),
            )
            .await;

        tracing::info!("Connected to realtime channel");
        Ok(())
    }

    /// Sends a message, or queues it durably when the channel is down.
    ///
    /// Infallible from the caller's perspective: the message is either
    /// transmitted or queued, and progress telemetry never fails the training
    /// workflow over connectivity.
    pub async fn send(&self, message: OutboundMessage) {
        self.coordinator.transmit(&self.connection, message).await;
    }

    /// User-initiated disconnect.
    ///
    /// Cancels any pending reconnect, tears down the read task, and closes
    /// the channel. No automatic reconnection happens until the next
    /// `connect()` call.
    pub async fn disconnect(&self) {
        tracing::info!("Disconnecting from realtime channel");

        // Manual flag first so a sleeping reconnect loop stands down
        {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = true;
            state.abort_tasks();
        }

        if let Err(e) = self.connection.close().await {
            tracing::warn!("Error closing channel: {}", e);
        }

        self.set_state(ConnectionState::Disconnected).await;
        tracing::info!("Disconnected from realtime channel");
    }

    /// Backoff loop run by the reconnect watcher after a failure-triggered
    /// disconnect. Exits on success, manual interruption, or an exhausted
    /// attempt budget (OfflineFallback).
    pub(crate) async fn run_reconnect_loop(&self) {
        loop {
            {
                let state = self.connection.state().await;
                if state != ConnectionState::Disconnected {
                    tracing::debug!("Stopping reconnect loop in state {:?}", state);
                    break;
                }
            }
            if self.state.read().await.was_manual_disconnect {
                break;
            }

            let attempt = self.state.read().await.reconnect_attempts + 1;
            let Some(delay) = self.backoff.delay_for(attempt) else {
                tracing::warn!(
                    "Giving up after {} reconnect attempts; queuing until manual connect",
                    self.backoff.max_attempts()
                );
                self.set_state(ConnectionState::OfflineFallback).await;
                break;
            };

            tracing::info!("Reconnect attempt {} in {:?}", attempt, delay);
            tokio::time::sleep(delay).await;

            if self.state.read().await.was_manual_disconnect {
                tracing::info!("Manual disconnect, cancelling reconnect");
                break;
            }

            match self.try_connect().await {
                Ok(()) => {
                    tracing::info!("Reconnected");
                    break;
                }
                Err(e) => {
                    tracing::error!("Reconnect attempt {} failed: {}", attempt, e);
                    self.state.write().await.reconnect_attempts = attempt;
                }
            }
        }
    }

    /// Registers a handler for an inbound event type.
    ///
    /// Convenience wrapper around [`dispatcher()`](Self::dispatcher).
    pub fn on<F>(&self, event: InboundEvent, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.dispatcher.on(event, handler);
    }

    /// Watch receiver for `(state, was_manual_disconnect)` changes; drives
    /// the passive connection indicator.
    pub async fn state_changes(&self) -> watch::Receiver<(ConnectionState, bool)> {
        self.state.read().await.state_change_tx.subscribe()
    }

    pub async fn state(&self) -> ConnectionState {
        self.connection.state().await
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Consecutive failed automatic reconnect attempts.
    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.reconnect_attempts
    }

    /// Messages currently held in the durable pending queue.
    pub fn pending_count(&self) -> usize {
        self.coordinator.queue().len()
    }

    /// The stable, locally generated user identifier.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        &self.dispatcher
    }

    /// Channel lost underneath us: drop the dead writer and enter the retry
    /// path.
    async fn handle_channel_loss(&self) {
        self.connection.clear_writer().await;
        self.set_state(ConnectionState::Disconnected).await;
    }

    /// Set connection state, reset the attempt counter on Connected, and
    /// notify watchers.
    async fn set_state(&self, new_state: ConnectionState) {
        self.connection.set_state(new_state).await;

        let mut state = self.state.write().await;
        if new_state == ConnectionState::Connected {
            state.reconnect_attempts = 0;
        }
        state.notify_state_change(new_state, state.was_manual_disconnect);
    }

    /// Builds `<ws|wss>://<host>/ws/progress` per the secure flag.
    fn endpoint_url(&self) -> Result<String> {
        let scheme = if self.options.secure { "wss" } else { "ws" };
        let url = Url::parse(&format!("{}://{}{}", scheme, self.options.host, CHANNEL_PATH))?;
        Ok(url.to_string())
    }
}
