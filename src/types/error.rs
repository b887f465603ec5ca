use thiserror::Error;

/// Errors that can occur inside the progress sync client.
///
/// Note that [`ProgressClient::send`](crate::client::ProgressClient::send)
/// never returns these: network conditions route messages into the pending
/// queue instead of failing the caller.
#[derive(Error, Debug)]
pub enum SyncError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed host)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Local store read/write failure
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Convenience type alias for `Result<T, SyncError>`.
pub type Result<T> = std::result::Result<T, SyncError>;
