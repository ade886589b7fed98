use std::time::Duration;

use thiserror::Error;

/// Errors returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum ExoyOneError {
    /// No reply arrived within the per-attempt timeout, after all retries.
    #[error("no reply from {host}:{port} within {timeout:?} ({attempts} attempts)")]
    Timeout {
        host: String,
        port: u16,
        timeout: Duration,
        attempts: u32,
    },

    /// A caller-supplied value failed a precondition. No request was sent.
    #[error("invalid value: {0}")]
    Validation(String),

    /// A reply could not be decoded into a complete device state.
    #[error("failed to decode device state")]
    Decoding(#[from] serde_json::Error),

    /// A catalog index was outside the catalog bounds.
    #[error("{what} index {index} is out of range (0..{len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Socket level failure (bind, connect, send, receive).
    #[error("network error")]
    Io(#[from] std::io::Error),
}

impl ExoyOneError {
    /// Only timeouts are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExoyOneError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExoyOneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeout_is_retryable() {
        let timeout = ExoyOneError::Timeout {
            host: "127.0.0.1".to_string(),
            port: 8888,
            timeout: Duration::from_millis(10),
            attempts: 1,
        };
        assert!(timeout.is_retryable());
        assert!(!ExoyOneError::Validation("east".to_string()).is_retryable());

        let decoding = serde_json::from_str::<u8>("nope").unwrap_err();
        assert!(!ExoyOneError::from(decoding).is_retryable());
    }
}
