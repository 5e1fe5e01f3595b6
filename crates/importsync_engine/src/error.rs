//! Error types for the importsync engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while driving a reconciliation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A core invariant was violated (duplicate identity, bad chunk hint).
    #[error(transparent)]
    Core(#[from] importsync_core::CoreError),

    /// A buffered loader was configured with a zero page size.
    #[error("page size must be positive, got {got}")]
    InvalidPageSize {
        /// The rejected value.
        got: usize,
    },

    /// A record stream collaborator failed. Not retried by the engine.
    #[error("source error: {0}")]
    Source(String),

    /// The persistence sink failed. The destination diff set is left in
    /// whatever partial state the failing chunk produced.
    #[error("sink error: {0}")]
    Sink(String),
}

impl EngineError {
    /// Creates a source collaborator error.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Creates a persistence sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink(message.into())
    }
}
