use crate::storage::LocalStore;
use crate::types::constants::{storage_keys, MAX_PENDING_MESSAGES};
use crate::types::OutboundMessage;
use std::sync::{Arc, Mutex};

/// Durable FIFO queue of messages awaiting transmission.
///
/// The whole queue lives under one storage key as a serialized list and every
/// operation is a read-modify-write, so entries survive restarts without any
/// atomicity requirements beyond what the store itself provides. The queue is
/// bounded: once `cap` entries are pending the oldest is evicted to make
/// room.
pub struct PendingQueue {
    store: Arc<dyn LocalStore>,
    cap: usize,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl PendingQueue {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self::with_cap(store, MAX_PENDING_MESSAGES)
    }

    pub fn with_cap(store: Arc<dyn LocalStore>, cap: usize) -> Self {
        Self {
            store,
            cap,
            lock: Mutex::new(()),
        }
    }

    /// Appends a message, evicting the oldest entry if the queue is full.
    pub fn enqueue(&self, message: OutboundMessage) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut pending = self.load();
        if pending.len() >= self.cap {
            let evicted = pending.remove(0);
            tracing::warn!(
                "Pending queue full ({} entries), evicting oldest '{}' message",
                self.cap,
                evicted.event
            );
        }
        pending.push(message);
        self.save(&pending);
    }

    /// Removes and returns all pending messages in FIFO order.
    ///
    /// The caller owns re-enqueuing anything that fails to send afterwards;
    /// see [`requeue_front`](Self::requeue_front).
    pub fn drain(&self) -> Vec<OutboundMessage> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let pending = self.load();
        self.store.remove(storage_keys::PENDING_QUEUE);
        pending
    }

    /// Reinstates messages at the head of the queue, ahead of anything
    /// enqueued since the drain they came from.
    pub fn requeue_front(&self, mut messages: Vec<OutboundMessage>) {
        if messages.is_empty() {
            return;
        }
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut pending = self.load();
        messages.append(&mut pending);
        self.save(&messages);
    }

    pub fn len(&self) -> usize {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self) -> Vec<OutboundMessage> {
        let Some(raw) = self.store.get(storage_keys::PENDING_QUEUE) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!("Discarding corrupt pending queue: {}", e);
                Vec::new()
            }
        }
    }

    fn save(&self, pending: &[OutboundMessage]) {
        match serde_json::to_string(pending) {
            Ok(serialized) => {
                if let Err(e) = self.store.set(storage_keys::PENDING_QUEUE, &serialized) {
                    tracing::warn!("Failed to persist pending queue: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize pending queue: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::OutboundEvent;
    use crate::storage::MemoryStore;
    use serde_json::{json, Map, Value};

    fn message(n: u64) -> OutboundMessage {
        let mut payload = Map::new();
        payload.insert("seq".to_string(), json!(n));
        OutboundMessage::new(OutboundEvent::ChallengeProgress, "user_test", payload)
    }

    fn seq(msg: &OutboundMessage) -> Value {
        msg.payload["seq"].clone()
    }

    #[test]
    fn test_enqueue_preserves_order() {
        let queue = PendingQueue::new(Arc::new(MemoryStore::new()));
        for n in 0..5 {
            queue.enqueue(message(n));
        }

        assert_eq!(queue.len(), 5);
        let drained = queue.drain();
        let seqs: Vec<Value> = drained.iter().map(seq).collect();
        assert_eq!(seqs, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn test_drain_empties_queue() {
        let queue = PendingQueue::new(Arc::new(MemoryStore::new()));
        queue.enqueue(message(1));
        queue.drain();
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_queue_survives_reconstruction() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());

        let queue = PendingQueue::new(Arc::clone(&store));
        queue.enqueue(message(7));
        drop(queue);

        let reloaded = PendingQueue::new(store);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(seq(&reloaded.drain()[0]), json!(7));
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let queue = PendingQueue::with_cap(Arc::new(MemoryStore::new()), 3);
        for n in 0..5 {
            queue.enqueue(message(n));
        }

        let drained = queue.drain();
        let seqs: Vec<Value> = drained.iter().map(seq).collect();
        assert_eq!(seqs, vec![json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn test_requeue_front_goes_ahead_of_newer_entries() {
        let queue = PendingQueue::new(Arc::new(MemoryStore::new()));
        queue.enqueue(message(0));
        queue.enqueue(message(1));
        queue.enqueue(message(2));

        let mut drained = queue.drain();
        // Pretend only the first message made it out before the drop
        drained.remove(0);
        queue.enqueue(message(3));
        queue.requeue_front(drained);

        let seqs: Vec<Value> = queue.drain().iter().map(seq).collect();
        assert_eq!(seqs, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_corrupt_store_is_discarded() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        store
            .set(crate::types::constants::storage_keys::PENDING_QUEUE, "{{{")
            .unwrap();

        let queue = PendingQueue::new(store);
        assert!(queue.is_empty());
        queue.enqueue(message(1));
        assert_eq!(queue.len(), 1);
    }
}
