use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors surfaced by the clustering engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClusterError {
    /// Empty or malformed text, or a configuration value out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation that needs at least one document ran on an empty corpus.
    #[error("corpus is empty")]
    EmptyCorpus,

    /// The configuration names a grouping scheme this engine does not know.
    #[error("unknown grouping algorithm: {0}")]
    UnknownAlgorithm(String),

    /// A snapshot could not be encoded, decoded, or is inconsistent.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl ClusterError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ClusterError::InvalidInput(msg.into())
    }
}

impl From<serde_cbor::Error> for ClusterError {
    fn from(err: serde_cbor::Error) -> Self {
        ClusterError::Snapshot(err.to_string())
    }
}
