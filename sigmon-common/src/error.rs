//! Common error types for SIGMON

use thiserror::Error;

/// Common result type for SIGMON operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SIGMON crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Delivered record could not be decoded into a measurement
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

/// Failures talking to the external measurement service
///
/// Shared by the bulk reader and the push channel so the feed can treat
/// both sources uniformly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    /// Response body was not the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Channel was closed before or during the operation
    #[error("Channel closed: {0}")]
    Closed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Status(503, "maintenance".to_string());
        assert_eq!(err.to_string(), "HTTP 503: maintenance");

        assert_eq!(
            TransportError::Network("refused".to_string()).to_string(),
            "Network error: refused"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
