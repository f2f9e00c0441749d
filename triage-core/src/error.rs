//! Error types for the triage core.

/// Result type alias for triage-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types produced by the deterministic core.
///
/// Per-variation and per-check failures are absorbed by the runner and the
/// evaluator respectively and never surface as an `Error` here; only
/// configuration problems and cross-agent/invalid-input misuse are fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cross-agent access denied: observation agent {observation} does not match tracker agent {tracker}")]
    AgentMismatch { tracker: String, observation: String },

    #[error("unknown pattern {0} for this agent")]
    UnknownPattern(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying the operation that produced this error could help.
    /// Configuration and invalid-input errors never are; they require a
    /// caller-side fix.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Serialization(_))
    }
}
