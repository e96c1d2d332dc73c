use storage_manager::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection failure, timeout, or any other transport-level problem.
    /// The only retryable variant.
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx response whose body could not be parsed as JSON.
    #[error("Invalid server response")]
    InvalidServerResponse,

    /// 401 that persisted through one refresh-and-retry cycle. Stored
    /// credentials have already been cleared when this is returned.
    #[error("Session expired. Please login again.")]
    SessionExpired,

    /// Refresh was attempted with no refresh token in storage.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Non-2xx response, carrying the message extracted from the body.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
