// Infrastructure module - reconnect scheduling
pub mod backoff;

pub use backoff::Backoff;
