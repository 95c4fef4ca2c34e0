use thiserror::Error;

/// Typed error enum for feed source requests
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedApiError {
    /// Timeouts, refused connections and other transport failures
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the feed endpoint
    #[error("Feed request failed: {message} (status: {status})")]
    Status { status: u16, message: String },

    /// Response body did not match the expected page shape
    #[error("Invalid data received from the video API: {0}")]
    Schema(String),

    #[error("Feed API error: {0}")]
    Other(String),
}

impl FeedApiError {
    /// Check if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            FeedApiError::Network(_) => true,
            FeedApiError::Status { status, .. } => *status == 429 || *status >= 500,
            FeedApiError::Schema(_) | FeedApiError::Other(_) => false,
        }
    }

    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FeedApiError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            FeedApiError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() {
            FeedApiError::Network(format!("Request error: {}", error))
        } else if error.is_decode() {
            FeedApiError::Schema(error.to_string())
        } else {
            FeedApiError::Other(error.to_string())
        }
    }

    pub fn from_status(status: u16, body: String) -> Self {
        FeedApiError::Status {
            status,
            message: body,
        }
    }
}
