use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty reply from backend")]
    EmptyReply,

    #[error("Response blocked: {reason}")]
    Blocked {
        reason: String,
        message: Option<String>,
    },

    #[error("Invalid or rejected API key: {0}")]
    InvalidApiKey(String),
}

impl ProviderError {
    /// Fold a transport failure into the taxonomy, keeping timeouts distinct
    /// so fallback strings can name them.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("No such session: {0}")]
    SessionMissing(i64),

    #[error("Unknown sender value: {0}")]
    UnknownSender(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
