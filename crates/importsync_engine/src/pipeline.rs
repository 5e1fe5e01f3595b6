//! The chunked sync driver.
//!
//! [`ChunkedSync`] runs a whole import from two ordered record streams:
//! the merge chunker slices them into memory-bounded chunk pairs, each pair
//! is materialized as a source [`DataSet`] and a fresh destination
//! [`DiffDataSet`], the configured policy reconciles them, and the
//! destination diff is handed to a persistence sink callback.
//!
//! Chunks are strictly sequential: chunk *i+1* is only pulled after chunk
//! *i* has been reconciled and persisted. There is no cross-chunk
//! atomicity; a sink failure aborts the run and earlier chunks stay
//! persisted. Callers wanting bounded-time imports should bound the streams
//! they pass in, not expect cancellation from the driver.

use serde::{Deserialize, Serialize};
use tracing::debug;

use importsync_core::{DataSet, DiffDataSet, MergeChunks, NaturalKey, Record};

use crate::error::EngineResult;
use crate::reconcile::{additive_sync, full_sync, SyncMode, SyncOptions};

/// Aggregate counts over a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Number of chunk pairs reconciled.
    pub chunks: usize,
    /// Records added across all chunks.
    pub added: u64,
    /// Records removed across all chunks.
    pub removed: u64,
    /// Records changed in place across all chunks.
    pub changed: u64,
}

/// Drives chunked reconciliation of two ordered record streams.
#[derive(Debug, Clone, Default)]
pub struct ChunkedSync {
    options: SyncOptions,
}

impl ChunkedSync {
    /// Creates a driver with the given options.
    pub fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    /// Returns the configured options.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Reconciles the destination stream against the source stream.
    ///
    /// Both streams must be ordered by natural key under the same order
    /// relation; chunk boundary safety depends on it. The sink is invoked
    /// once per chunk after reconciliation with the materialized source set
    /// and the mutated destination diff set; persisting `added`, `removed`
    /// and `changed` is the sink's job.
    ///
    /// # Errors
    ///
    /// Propagates duplicate-identity errors from chunk materialization and
    /// any error returned by the sink; no recovery is attempted.
    pub fn run<K, S, D, F>(&self, source: S, destination: D, mut sink: F) -> EngineResult<SyncReport>
    where
        K: NaturalKey,
        S: IntoIterator<Item = Record<K>>,
        D: IntoIterator<Item = Record<K>>,
        F: FnMut(&DataSet<K>, &DiffDataSet<K>) -> EngineResult<()>,
    {
        let chunks = MergeChunks::new(
            source.into_iter(),
            destination.into_iter(),
            self.options.chunk_hint,
        )?;

        let mut report = SyncReport::default();
        for (source_chunk, destination_chunk) in chunks {
            let source_set = DataSet::from_records(source_chunk)?;
            let mut destination_set = DiffDataSet::from_records(destination_chunk)?;

            match self.options.mode {
                SyncMode::Additive => additive_sync(&source_set, &mut destination_set),
                SyncMode::Full => full_sync(&source_set, &mut destination_set, &self.options),
            }

            let added = destination_set.added().count() as u64;
            let removed = destination_set.removed().count() as u64;
            let changed = destination_set.changed().count() as u64;
            report.chunks += 1;
            report.added += added;
            report.removed += removed;
            report.changed += changed;
            debug!(
                chunk = report.chunks,
                added, removed, changed, "reconciled chunk"
            );

            sink(&source_set, &destination_set)?;
        }

        Ok(report)
    }
}
