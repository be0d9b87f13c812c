//! Error types for the voice recorder

use thiserror::Error;

/// Result type alias for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Errors that can occur in the recording subsystem
///
/// Capture-path errors (`PermissionDenied`, `DeviceUnavailable`, `Encoder`)
/// are fatal to the current recording attempt and surfaced to the user.
/// `Engine` errors come from the recognition path and never interrupt capture.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Microphone or recognition consent refused by the user
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    /// No usable audio input device
    #[error("no audio input device available: {0}")]
    DeviceUnavailable(String),

    /// Capture encoder failed to start, stop or produce data
    #[error("capture encoder error: {0}")]
    Encoder(String),

    /// Recognition engine error (transient, capture continues)
    #[error("recognition engine error: {0}")]
    Engine(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecorderError {
    /// Whether the error should be surfaced as a user-facing notification
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            RecorderError::PermissionDenied(_) | RecorderError::DeviceUnavailable(_)
        )
    }
}
