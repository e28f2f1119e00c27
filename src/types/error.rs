use thiserror::Error;

/// Errors that can occur when using the mailbox realtime client.
#[derive(Error, Debug)]
pub enum MailboxError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Incoming frame was not well-formed JSON text
    #[error("Decode error: {0}")]
    Decode(String),

    /// Well-formed frame missing or mistyping a required field
    #[error("Invalid message structure: {0}")]
    Validation(String),

    /// Incoming frame representation the codec cannot decode
    #[error("Unsupported frame representation: {0}")]
    UnsupportedFrame(&'static str),

    /// Server explicitly reported failure for a request
    #[error("Server error {code}: {name}")]
    Server { code: i64, name: String },

    /// Correlated request did not receive a reply in time
    #[error("Request timed out on channel '{0}'")]
    RequestTimeout(String),

    /// A newer correlated request on the same channel displaced this one
    #[error("Request on channel '{0}' superseded by a newer request")]
    RequestSuperseded(String),

    /// JSON serialization error on the outbound path
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Connection establishment did not complete in time
    #[error("Connection attempt timed out")]
    ConnectTimeout,

    /// The connection closed while a request was pending
    #[error("Connection closed")]
    ConnectionClosed,

    /// Attempted operation while not connected to the server
    #[error("Not connected")]
    NotConnected,

    /// `connect()` called while another connect is in flight
    #[error("Connection attempt already in progress")]
    AlreadyConnecting,
}

/// Convenience type alias for `Result<T, MailboxError>`.
pub type Result<T> = std::result::Result<T, MailboxError>;
