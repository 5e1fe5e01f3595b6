//! # importsync engine
//!
//! Reconciliation of a destination record collection against a source feed.
//!
//! This crate provides:
//! - The additive and full sync policies with the status-aware override
//!   table ([`additive_sync`], [`full_sync`])
//! - The chunked sync driver for arbitrarily large ordered streams
//!   ([`ChunkedSync`])
//! - Buffered page loading of ordered records from an external store
//!   ([`BufferedLoader`])
//!
//! ## Architecture
//!
//! A run is **chunk at a time**: the merge chunker slices both ordered
//! streams into paired batches that never split a run of equal keys, each
//! pair is reconciled in memory, and the resulting diff is handed to the
//! caller's persistence sink before the next chunk is pulled. Atomicity is
//! per chunk at most; the engine itself retries nothing.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod loader;
mod pipeline;
mod reconcile;

pub use error::{EngineError, EngineResult};
pub use loader::{BufferedLoader, BufferedRecords, PageSource, VecSource};
pub use pipeline::{ChunkedSync, SyncReport};
pub use reconcile::{additive_sync, full_sync, SyncMode, SyncOptions};
