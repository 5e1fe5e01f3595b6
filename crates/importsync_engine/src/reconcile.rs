//! Reconciliation policies.
//!
//! Both policies operate on a read-only source [`DataSet`] and a
//! destination [`DiffDataSet`], mutating the destination in place so the
//! caller can persist its `added`/`removed`/`changed` views afterwards.
//!
//! The status-aware override policy, by source presence and destination
//! status:
//!
//! | in source | dest status | action                        |
//! |-----------|-------------|-------------------------------|
//! | yes       | Imported    | update content                |
//! | yes       | Invalid     | update content, stays Invalid |
//! | yes       | Forced      | convert to Imported           |
//! | yes       | absent      | add as Imported               |
//! | no        | Imported    | delete (full only)            |
//! | no        | Invalid     | delete (full only, default)   |
//! | no        | Forced      | keep unchanged                |
//!
//! Collaborator failures are not caught here; atomicity, where required, is
//! the caller's responsibility, typically per chunk.

use serde::{Deserialize, Serialize};
use tracing::debug;

use importsync_core::{DataSet, DiffDataSet, ImportStatus, NaturalKey};

/// Which reconciliation policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Add and update from the source; never delete.
    Additive,
    /// Additive, then delete destination records absent from the source
    /// (subject to the status overrides).
    Full,
}

/// Options for a reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Combined target size of a source/destination chunk pair.
    pub chunk_hint: usize,
    /// The policy to apply per chunk.
    pub mode: SyncMode,
    /// Keep `Invalid` destination records that are absent from the source
    /// instead of deleting them.
    pub retain_invalid: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            chunk_hint: 16384,
            mode: SyncMode::Full,
            retain_invalid: false,
        }
    }
}

impl SyncOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk hint.
    #[must_use]
    pub const fn chunk_hint(mut self, hint: usize) -> Self {
        self.chunk_hint = hint;
        self
    }

    /// Sets the sync mode.
    #[must_use]
    pub const fn mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets whether absent `Invalid` records are retained.
    #[must_use]
    pub const fn retain_invalid(mut self, retain: bool) -> Self {
        self.retain_invalid = retain;
        self
    }
}

/// Projects the source onto the destination without deleting anything.
///
/// For every source record: absent in the destination, it is added with
/// status `Imported`; present with status `Forced`, the status is flipped
/// to `Imported` and the content left untouched; otherwise the destination
/// copy's content is synced from the source record through the standard
/// change-notification path.
pub fn additive_sync<K: NaturalKey>(source: &DataSet<K>, destination: &mut DiffDataSet<K>) {
    for record in source.iter() {
        if !destination.contains(record.key()) {
            let mut incoming = record.clone();
            incoming.set_status(Some(ImportStatus::Imported));
            destination.add(incoming);
        } else if let Some(existing) = destination.get_mut(record.key()) {
            if existing.status() == Some(ImportStatus::Forced) {
                // The source now vouches for the forced entry; content is
                // deliberately left alone.
                existing.set_status(Some(ImportStatus::Imported));
            } else {
                existing.sync_from(record);
            }
        }
    }
}

/// Projects the source onto the destination, deleting stale records.
///
/// Runs [`additive_sync`], then removes every destination record absent
/// from the source unless its status protects it: `Forced` records always
/// survive, and `Invalid` records survive when
/// [`SyncOptions::retain_invalid`] is set.
pub fn full_sync<K: NaturalKey>(
    source: &DataSet<K>,
    destination: &mut DiffDataSet<K>,
    options: &SyncOptions,
) {
    additive_sync(source, destination);

    let stale: Vec<K> = destination
        .iter()
        .filter(|record| !source.contains(record.key()))
        .filter(|record| match record.status() {
            Some(ImportStatus::Forced) => false,
            Some(ImportStatus::Invalid) => !options.retain_invalid,
            _ => true,
        })
        .map(|record| record.key().clone())
        .collect();

    debug!(stale = stale.len(), "deleting records absent from source");
    for key in &stale {
        destination.pop(key);
    }
}
