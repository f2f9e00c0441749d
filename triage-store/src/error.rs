//! Error types for the pattern store and A/B state persistence.

/// Result type alias for triage-store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Core(#[from] triage_core::Error),

    #[error("invalid store configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether retrying the operation that produced this error could help.
    /// A lock contention or transient I/O failure might resolve itself; a
    /// malformed row or a configuration mistake will not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Io(_))
    }
}
