use super::connection::ConnectionState;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Consolidated mutable state for ProgressClient.
/// A single struct keeps lock acquisition to one place.
pub struct ClientState {
    /// Consecutive failed automatic reconnect attempts; resets to zero on
    /// entering Connected
    pub reconnect_attempts: u32,

    /// Whether the last disconnect was user-initiated (suppresses
    /// auto-reconnect)
    pub was_manual_disconnect: bool,

    /// Background tasks owned by the current connection (read loop)
    tasks: Vec<JoinHandle<()>>,

    /// Sender for (state, was_manual) change notifications
    pub state_change_tx: watch::Sender<(ConnectionState, bool)>,
}

impl ClientState {
    pub fn new(state_change_tx: watch::Sender<(ConnectionState, bool)>) -> Self {
        Self {
            reconnect_attempts: 0,
            was_manual_disconnect: false,
            tasks: Vec::new(),
            state_change_tx,
        }
    }

    /// Notify state change watchers
    pub fn notify_state_change(&self, state: ConnectionState, manual: bool) {
        if self.state_change_tx.send((state, manual)).is_err() {
            tracing::debug!(
                "State change watcher disconnected, could not notify state: {:?}",
                state
            );
        }
    }

    /// Track a background task for later teardown
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.tasks.retain(|h| !h.is_finished());
        self.tasks.push(handle);
    }

    /// Abort every tracked task
    pub fn abort_tasks(&mut self) {
        for handle in &self.tasks {
            handle.abort();
        }
        self.tasks.clear();
    }
}
