pub mod constants;
pub mod error;
pub mod message;

pub use error::{Result, SyncError};
pub use message::OutboundMessage;
