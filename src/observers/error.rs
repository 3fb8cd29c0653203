//! Error type shared by the observers.

use thiserror::Error;

/// Error returned by observer operations.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Serialization failed in the JSON observer.
    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output could not be written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for observer operations.
pub type Result<T> = std::result::Result<T, ObserverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: ObserverError = std::io::Error::other("closed pipe").into();
        assert!(err.to_string().contains("closed pipe"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_error_converts() {
        let err = serde_json::from_str::<u64>("nope").unwrap_err();
        let err: ObserverError = err.into();
        assert!(err.to_string().starts_with("json error"));
    }
}
