//! Error types shared by every tabforest crate

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types organized by layer
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Store/Engine Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Tab not found: {tab_id}")]
    NotFound { tab_id: String },

    #[error("Engine session error: {message}")]
    EngineSession { message: String },

    // ─────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed browser state snapshot: {message}")]
    MalformedSnapshot { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn not_found(tab_id: impl Into<String>) -> Self {
        Self::NotFound {
            tab_id: tab_id.into(),
        }
    }

    pub fn engine_session(message: impl Into<String>) -> Self {
        Self::EngineSession {
            message: message.into(),
        }
    }

    pub fn malformed_snapshot(message: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Missing tabs and failed session creation are expected races between a
    /// tab being closed and work that was already queued for it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::EngineSession { .. } | Error::ChannelSend { .. }
        )
    }

    /// Check if this error aborts the whole operation with no partial result
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MalformedSnapshot { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::not_found("tab-1");
        assert_eq!(err.to_string(), "Tab not found: tab-1");

        let err = Error::malformed_snapshot("Unknown session key: foo");
        assert!(err.to_string().contains("Unknown session key: foo"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_malformed_snapshot_is_fatal() {
        assert!(Error::malformed_snapshot("missing url").is_fatal());
        assert!(!Error::malformed_snapshot("missing url").is_recoverable());
        assert!(!Error::not_found("tab").is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::not_found("tab").is_recoverable());
        assert!(Error::engine_session("renderer died").is_recoverable());
        assert!(Error::channel_send("closed").is_recoverable());
        assert!(!Error::ChannelClosed.is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
    }

    #[test]
    fn test_context_preserves_error() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = result.context("Saving snapshot").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
