use crate::client::ConnectionManager;
use crate::queue::PendingQueue;
use crate::types::OutboundMessage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Bridges the pending queue and the live connection.
///
/// All outbound traffic funnels through here so that a `send` racing a
/// reconnect flush serializes behind the drain and can never jump ahead of
/// older queued messages.
///
/// The channel protocol carries no per-message acknowledgment, so delivery is
/// at-most-once: "sent" means the channel was open when the frame was
/// written. A send that fails locally is re-queued, including everything
/// behind it during a flush.
pub struct SyncCoordinator {
    queue: Arc<PendingQueue>,
    // Serializes live sends behind an in-progress drain
    drain_lock: Mutex<()>,
}

impl SyncCoordinator {
    pub fn new(queue: Arc<PendingQueue>) -> Self {
        Self {
            queue,
            drain_lock: Mutex::new(()),
        }
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    /// Transmits over a live connection, or queues the message when the
    /// connection is down or the write fails. Never fails the caller.
    pub async fn transmit(&self, connection: &ConnectionManager, message: OutboundMessage) {
        let _guard = self.drain_lock.lock().await;
        self.transmit_locked(connection, message).await;
    }

    /// Connect-time replay, invoked once per transition into Connected.
    ///
    /// The drain lock is held across the Connected state flip
    /// (`mark_connected`), the queue drain, and the presence announcement,
    /// so a `send` racing the reconnect blocks until the backlog is out and
    /// cannot interleave ahead of older queued messages.
    pub async fn on_connected<F>(
        &self,
        connection: &ConnectionManager,
        announcement: OutboundMessage,
        mark_connected: F,
    ) where
        F: Future<Output = ()>,
    {
        let _guard = self.drain_lock.lock().await;
        mark_connected.await;
        self.flush_locked(connection).await;
        self.transmit_locked(connection, announcement).await;
    }

    /// Drains the queue over a live channel in FIFO order.
    pub async fn flush(&self, connection: &ConnectionManager) {
        let _guard = self.drain_lock.lock().await;
        self.flush_locked(connection).await;
    }

    async fn transmit_locked(&self, connection: &ConnectionManager, message: OutboundMessage) {
        if !connection.is_connected().await {
            self.queue.enqueue(message);
            return;
        }

        if let Err(e) = connection.send_message(&message).await {
            tracing::warn!("Send failed, queuing '{}' message: {}", message.event, e);
            self.queue.enqueue(message);
        }
    }

    /// If a write fails mid-drain the failed message and everything behind
    /// it go back to the front of the queue, still in order.
    async fn flush_locked(&self, connection: &ConnectionManager) {
        let pending = self.queue.drain();
        if pending.is_empty() {
            return;
        }
        tracing::info!("Flushing {} queued message(s)", pending.len());

        for (sent, message) in pending.iter().enumerate() {
            if let Err(e) = connection.send_message(message).await {
                tracing::warn!(
                    "Flush interrupted after {} message(s): {}; re-queuing the rest",
                    sent,
                    e
                );
                self.queue.requeue_front(pending[sent..].to_vec());
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ConnectionState;
    use crate::messaging::OutboundEvent;
    use crate::storage::MemoryStore;
    use serde_json::{json, Map, Value};

    fn message(seq: u64) -> OutboundMessage {
        let mut payload = Map::new();
        payload.insert("seq".to_string(), json!(seq));
        OutboundMessage::new(OutboundEvent::ChallengeProgress, "user_test", payload)
    }

    fn seqs(messages: &[OutboundMessage]) -> Vec<Value> {
        messages.iter().map(|m| m.payload["seq"].clone()).collect()
    }

    #[tokio::test]
    async fn test_flush_requeues_everything_on_dead_channel() {
        let queue = Arc::new(PendingQueue::new(Arc::new(MemoryStore::new())));
        for seq in 0..3 {
            queue.enqueue(message(seq));
        }
        let coordinator = SyncCoordinator::new(Arc::clone(&queue));

        // Connected state but the writer is gone, so every write fails
        let connection = ConnectionManager::new();
        connection.set_state(ConnectionState::Connected).await;

        coordinator.flush(&connection).await;

        // The failed message and everything behind it are back, in order
        let drained = queue.drain();
        assert_eq!(seqs(&drained), vec![json!(0), json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_transmit_queues_on_write_failure() {
        let queue = Arc::new(PendingQueue::new(Arc::new(MemoryStore::new())));
        let coordinator = SyncCoordinator::new(Arc::clone(&queue));

        let connection = ConnectionManager::new();
        connection.set_state(ConnectionState::Connected).await;

        coordinator.transmit(&connection, message(7)).await;

        let drained = queue.drain();
        assert_eq!(seqs(&drained), vec![json!(7)]);
    }

    #[tokio::test]
    async fn test_transmit_queues_while_disconnected() {
        let queue = Arc::new(PendingQueue::new(Arc::new(MemoryStore::new())));
        let coordinator = SyncCoordinator::new(Arc::clone(&queue));
        let connection = ConnectionManager::new();

        coordinator.transmit(&connection, message(1)).await;
        coordinator.transmit(&connection, message(2)).await;

        assert_eq!(seqs(&queue.drain()), vec![json!(1), json!(2)]);
    }
}
