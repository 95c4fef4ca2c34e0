use thiserror::Error;

/// Failures reported by a media element or an adaptive streaming engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("Play request rejected: {0}")]
    PlayRejected(String),

    #[error("Seek to {position:.2}s failed: {message}")]
    SeekFailed { position: f64, message: String },

    #[error("Playback rate {rate} rejected: {message}")]
    RateRejected { rate: f64, message: String },

    #[error("Media source error: {0}")]
    Source(String),
}

/// Failures talking to an item controller task
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Item controller disconnected")]
    Disconnected,

    #[error("Failed to receive response from item controller")]
    NoResponse,
}
