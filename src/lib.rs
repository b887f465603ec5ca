//! # progress-realtime
//!
//! Client-side sync core for a realtime training-progress channel: a single
//! reconnecting WebSocket connection with exponential backoff, durable
//! offline queuing with FIFO replay, and type-dispatched inbound push
//! handling.
//!
//! ## Example
//!
//! ```no_run
//! use progress_realtime::{FileStore, ProgressClientBuilder, ProgressClientOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::new("./data")?);
//!     let client = ProgressClientBuilder::new(
//!         ProgressClientOptions {
//!             host: "training.example.com".to_string(),
//!             ..Default::default()
//!         },
//!         store,
//!     )?
//!     .build();
//!
//!     client.connect().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod coordinator;
pub mod infrastructure;
pub mod messaging;
pub mod queue;
pub mod storage;
pub mod types;

pub use client::{ConnectionState, ProgressClient, ProgressClientBuilder, ProgressClientOptions};
pub use coordinator::SyncCoordinator;
pub use infrastructure::Backoff;
pub use messaging::{InboundEvent, MessageDispatcher, OutboundEvent};
pub use queue::PendingQueue;
pub use storage::{FileStore, LocalStore, MemoryStore, ProfileStore};
pub use types::{OutboundMessage, Result, SyncError};
