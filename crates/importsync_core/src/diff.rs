//! Diff-tracking record sets.
//!
//! A [`DiffDataSet`] is a [`DataSet`] that additionally records which
//! members were added, removed and changed since the start of the current
//! tracking epoch. Using it as the destination of a reconciliation lets the
//! caller persist exactly the minimal set of inserts, deletes and updates
//! needed to bring an external store in sync, instead of re-writing the
//! whole collection.
//!
//! Change tracking works through the record listener contract: the set
//! installs a single shared change hook on every member, and a notification
//! from a member marks its key as changed. The tracking state is re-derived
//! incrementally on every `add`/`pop`, never recomputed from scratch; it is
//! discarded only by an explicit [`reset`](DiffDataSet::reset) or
//! [`clear`](DiffDataSet::clear).

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::dataset::DataSet;
use crate::error::{CoreError, CoreResult};
use crate::record::{Listener, NaturalKey, Record};

/// A data set that records additions, removals and in-place changes.
pub struct DiffDataSet<K: NaturalKey> {
    records: DataSet<K>,
    /// Keys added during the current epoch; the records live in `records`.
    added: BTreeSet<K>,
    /// The replaced or popped record instances.
    removed: DataSet<K>,
    /// Keys marked by the change hook. Shared with the hook closure.
    changed: Arc<RwLock<BTreeSet<K>>>,
    hook: Listener<K>,
}

impl<K: NaturalKey> DiffDataSet<K> {
    /// Creates an empty diff-tracking data set.
    pub fn new() -> Self {
        let changed = Arc::new(RwLock::new(BTreeSet::new()));
        let sink = Arc::clone(&changed);
        let hook: Listener<K> = Arc::new(move |record: &Record<K>| {
            sink.write().insert(record.key().clone());
        });
        Self {
            records: DataSet::new(),
            added: BTreeSet::new(),
            removed: DataSet::new(),
            changed,
            hook,
        }
    }

    /// Builds a diff-tracking data set from an iterable of records.
    ///
    /// The initial members form the tracking baseline: they are not counted
    /// as additions, and the change hook is installed on each of them.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateIdentity`] if two records share a key.
    pub fn from_records<I>(records: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Record<K>>,
    {
        let mut set = Self::new();
        for mut record in records {
            if set.records.contains(record.key()) {
                return Err(CoreError::duplicate_identity(record.key()));
            }
            record.register(Arc::clone(&set.hook));
            set.records.add(record);
        }
        Ok(set)
    }

    /// Returns the stored record with this key, if any.
    pub fn get(&self, key: &K) -> Option<&Record<K>> {
        self.records.get(key)
    }

    /// Returns a mutable reference to the stored record with this key.
    ///
    /// Mutations through the returned reference fire the change hook and
    /// mark the record as changed.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut Record<K>> {
        self.records.get_mut(key)
    }

    /// Returns whether a record with this key is a member.
    pub fn contains(&self, key: &K) -> bool {
        self.records.contains(key)
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the members in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Record<K>> {
        self.records.iter()
    }

    /// Iterates over the member keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.records.keys()
    }

    /// Adds or replaces a record, updating the tracking state.
    ///
    /// - Adding a record wholly equal to the stored member is a no-op.
    /// - Re-adding an identity removed earlier in this epoch undoes the
    ///   removal: the record is stored as-is and counted as "back to
    ///   original", not as a net change.
    /// - Replacing an original member marks the replaced instance as
    ///   removed and the new record as added.
    ///
    /// The change hook is installed on the record before it is stored.
    pub fn add(&mut self, mut record: Record<K>) {
        let key = record.key().clone();

        if let Some(existing) = self.records.get(&key) {
            if Self::same_record(existing, &record) {
                return;
            }
        }

        if self.removed.contains(&key) {
            self.removed.pop(&key);
            self.added.remove(&key);
            record.register(Arc::clone(&self.hook));
            self.records.add(record);
            return;
        }

        if self.records.contains(&key) && !self.added.contains(&key) {
            if let Some(replaced) = self.records.pop(&key) {
                self.removed.add(replaced);
            }
        }

        self.added.insert(key);
        record.register(Arc::clone(&self.hook));
        self.records.add(record);
    }

    /// Removes and returns the record with this key, updating the tracking
    /// state.
    ///
    /// Popping an identity added during this epoch cancels the addition;
    /// popping an original member marks it as removed.
    pub fn pop(&mut self, key: &K) -> Option<Record<K>> {
        let record = self.records.pop(key)?;
        if !self.added.remove(key) {
            self.removed.add(record.clone());
        }
        Some(record)
    }

    /// Forgets all recorded changes and starts a new tracking epoch.
    ///
    /// Membership is untouched. The change hook is re-installed on every
    /// record added during the finished epoch (registration is idempotent,
    /// so records that kept it are unaffected).
    pub fn reset(&mut self) {
        for key in &self.added {
            if let Some(record) = self.records.get_mut(key) {
                if !record.is_registered(&self.hook) {
                    record.register(Arc::clone(&self.hook));
                }
            }
        }
        self.added.clear();
        self.removed.clear();
        self.changed.write().clear();
    }

    /// Resets the tracking state and removes all members.
    pub fn clear(&mut self) {
        self.reset();
        self.records.clear();
    }

    /// Iterates over the members added during the current epoch.
    pub fn added(&self) -> impl Iterator<Item = &Record<K>> {
        self.added.iter().filter_map(|key| self.records.get(key))
    }

    /// Iterates over the record instances removed during the current epoch.
    pub fn removed(&self) -> impl Iterator<Item = &Record<K>> {
        self.removed.iter()
    }

    /// Iterates over the original members changed in place during the
    /// current epoch.
    ///
    /// Keys that were added this epoch or are no longer members are
    /// excluded, so `added`, `removed` and `changed` are pairwise disjoint
    /// as views.
    pub fn changed(&self) -> impl Iterator<Item = &Record<K>> {
        let keys: Vec<K> = self.changed.read().iter().cloned().collect();
        keys.into_iter().filter_map(move |key| {
            if self.added.contains(&key) {
                None
            } else {
                self.records.get(&key)
            }
        })
    }

    fn same_record(a: &Record<K>, b: &Record<K>) -> bool {
        a.key() == b.key() && a.status() == b.status() && a.fields().eq(b.fields())
    }
}

impl<K: NaturalKey> Default for DiffDataSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NaturalKey> fmt::Debug for DiffDataSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffDataSet")
            .field("len", &self.records.len())
            .field("added", &self.added.len())
            .field("removed", &self.removed.len())
            .field("changed", &self.changed.read().len())
            .finish_non_exhaustive()
    }
}
