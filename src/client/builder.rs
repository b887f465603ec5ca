use super::{ClientState, ConnectionManager, ConnectionState, ProgressClient};
use crate::coordinator::SyncCoordinator;
use crate::infrastructure::Backoff;
use crate::messaging::{InboundEvent, MessageDispatcher};
use crate::queue::PendingQueue;
use crate::storage::{LocalStore, ProfileStore};
use crate::types::constants::{BASE_RECONNECT_DELAY_MS, MAX_RECONNECT_ATTEMPTS};
use crate::types::{Result, SyncError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// Configuration for [`ProgressClient`].
#[derive(Debug, Clone)]
pub struct ProgressClientOptions {
    /// Backend host (and optional port), e.g. `training.example.com` or
    /// `127.0.0.1:8080`
    pub host: String,
    /// Use `wss://` instead of `ws://`; mirror of whether the app itself is
    /// served securely
    pub secure: bool,
    /// Override the base reconnect delay (milliseconds)
    pub reconnect_base_delay_ms: Option<u64>,
    /// Override the automatic reconnect attempt budget
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for ProgressClientOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            secure: true,
            reconnect_base_delay_ms: None,
            max_reconnect_attempts: None,
        }
    }
}

/// Builder for ProgressClient that wires up storage, dispatch, and the
/// reconnect watcher.
pub struct ProgressClientBuilder {
    options: ProgressClientOptions,
    store: Arc<dyn LocalStore>,
}

impl ProgressClientBuilder {
    /// Create a new builder over the given durable store.
    pub fn new(options: ProgressClientOptions, store: Arc<dyn LocalStore>) -> Result<Self> {
        if options.host.is_empty() {
            return Err(SyncError::Connection("host is required".to_string()));
        }
        Ok(Self { options, store })
    }

    /// Build the client and spawn the reconnect watcher.
    ///
    /// Must run inside a tokio runtime.
    pub fn build(self) -> ProgressClient {
        let profile = ProfileStore::new(Arc::clone(&self.store));
        let user_id = profile.user_id();

        let queue = Arc::new(PendingQueue::new(Arc::clone(&self.store)));
        let coordinator = Arc::new(SyncCoordinator::new(queue));

        let dispatcher = Arc::new(MessageDispatcher::new());
        wire_profile_handlers(&dispatcher, &profile);

        let backoff = Backoff::new(
            Duration::from_millis(
                self.options
                    .reconnect_base_delay_ms
                    .unwrap_or(BASE_RECONNECT_DELAY_MS),
            ),
            self.options
                .max_reconnect_attempts
                .unwrap_or(MAX_RECONNECT_ATTEMPTS),
        );

        let (state_tx, state_rx) = watch::channel((ConnectionState::Disconnected, false));

        let client = ProgressClient {
            options: self.options,
            user_id,
            profile,
            backoff,
            connection: Arc::new(ConnectionManager::new()),
            coordinator,
            dispatcher,
            state: Arc::new(RwLock::new(ClientState::new(state_tx))),
        };

        // Reconnection watcher: every failure-triggered disconnect re-enters
        // the backoff loop; manual disconnects do not.
        let client_for_watcher = client.clone();
        tokio::spawn(async move {
            let mut rx = state_rx;

            while rx.changed().await.is_ok() {
                let (state, was_manual) = *rx.borrow_and_update();

                if state == ConnectionState::Disconnected && !was_manual {
                    client_for_watcher.run_reconnect_loop().await;
                }
            }
            tracing::debug!("Reconnection watcher task finished");
        });

        client
    }
}

/// Built-in handlers keeping the local profile in step with pushed updates.
fn wire_profile_handlers(dispatcher: &MessageDispatcher, profile: &ProfileStore) {
    let profile_achievements = profile.clone();
    dispatcher.on(InboundEvent::AchievementUnlocked, move |message| {
        if let Some(achievement) = message.get("achievement") {
            profile_achievements.record_achievement(achievement);
        }
    });

    let profile_progress = profile.clone();
    dispatcher.on(InboundEvent::ProgressUpdate, move |message| {
        let category = message.get("category").and_then(Value::as_str);
        let progress = message.get("progress");
        if let (Some(category), Some(progress)) = (category, progress) {
            profile_progress.cache_progress(category, progress.clone());
        }
    });
}
