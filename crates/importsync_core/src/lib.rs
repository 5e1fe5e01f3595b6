//! # importsync core
//!
//! Core building blocks for reconciling two ordered collections of records
//! so that a destination ends up reflecting a source's membership and
//! content, while bounding peak memory via chunked streaming.
//!
//! This crate provides:
//! - The record model: identity-based equality, mutable content fields,
//!   change notification ([`Record`])
//! - Identity-keyed record sets ([`DataSet`])
//! - Diff tracking of additions, removals and in-place changes
//!   ([`DiffDataSet`])
//! - Ordered merge chunking of two sorted streams ([`MergeChunks`])
//!
//! ## Key invariants
//!
//! - Two records with equal natural keys are the same record regardless of
//!   content; hashing and ordering derive solely from the key.
//! - An assignment that does not change a value never fires notification.
//! - At most one record per identity exists in a data set; duplicate input
//!   is rejected, never silently dropped.
//! - A run of equal elements is never split across a chunk boundary.
//!
//! Everything here is single-threaded, synchronous and free of I/O; the
//! reconciliation policies and stream drivers live in `importsync_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod chunk;
mod dataset;
mod diff;
mod error;
mod record;

pub use chunk::MergeChunks;
pub use dataset::DataSet;
pub use diff::DiffDataSet;
pub use error::{CoreError, CoreResult};
pub use record::{FieldSchema, FieldValue, ImportStatus, Listener, NaturalKey, Record};
