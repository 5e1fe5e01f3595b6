//! Error types for importsync core.

use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in importsync core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An input iterable contained two records with the same natural key.
    ///
    /// This cannot be resolved automatically because it is ambiguous which
    /// of the duplicates should be retained.
    #[error("duplicate identity in input: {key}")]
    DuplicateIdentity {
        /// Debug rendering of the colliding natural key.
        key: String,
    },

    /// A field name outside the record's content schema was assigned.
    #[error("field is not part of the content schema: {field}")]
    UnknownField {
        /// The rejected field name.
        field: String,
    },

    /// The merge chunker was configured with a zero chunk hint.
    #[error("chunk hint must be positive, got {got}")]
    InvalidChunkHint {
        /// The rejected value.
        got: usize,
    },
}

impl CoreError {
    /// Creates a duplicate identity error from any debuggable key.
    pub fn duplicate_identity(key: &impl fmt::Debug) -> Self {
        Self::DuplicateIdentity {
            key: format!("{key:?}"),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Creates an invalid chunk hint error.
    pub fn invalid_chunk_hint(got: usize) -> Self {
        Self::InvalidChunkHint { got }
    }
}
