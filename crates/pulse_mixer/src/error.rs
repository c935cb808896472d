//! Mixer Error Types

use thiserror::Error;

/// Errors from mixer operations
///
/// A request the server declines is not an error: it comes back as a
/// `false` outcome. These variants cover the cases where the request
/// could not even be attempted.
#[derive(Error, Debug)]
pub enum MixerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to connect to audio server: {0}")]
    ConnectionFailed(String),

    #[error("Backend initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Feature not available: {0}")]
    FeatureNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl MixerError {
    /// Whether the error happened before a session was ready for requests
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MixerError::ConnectionFailed(_)
                | MixerError::InitializationFailed(_)
                | MixerError::FeatureNotAvailable(_)
                | MixerError::InvalidConfiguration(_)
        )
    }
}

/// Result type alias for mixer operations
pub type MixerResult<T> = Result<T, MixerError>;
