// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{ProgressClientBuilder, ProgressClientOptions};
pub use connection::{ConnectionManager, ConnectionState};
pub use core::ProgressClient;
pub use state::ClientState;
