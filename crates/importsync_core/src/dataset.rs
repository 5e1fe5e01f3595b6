//! Identity-keyed record sets.
//!
//! A [`DataSet`] is a set-like container keyed by natural key: at most one
//! record exists per identity. It behaves like a set that can also *get* a
//! member, which matters because two records with equal keys may still carry
//! different content.
//!
//! The container owns an internal ordered map rather than extending one, so
//! only the contracted operations are exposed and iteration order is the key
//! order (deterministic).

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::record::{NaturalKey, Record};

/// A mutable set of records with at most one record per natural key.
#[derive(Debug, Clone, Default)]
pub struct DataSet<K: NaturalKey> {
    records: BTreeMap<K, Record<K>>,
}

impl<K: NaturalKey> DataSet<K> {
    /// Creates an empty data set.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Builds a data set from an iterable of records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateIdentity`] if two records share a
    /// natural key; it is ambiguous which of them should be retained, and no
    /// partial state is kept.
    pub fn from_records<I>(records: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Record<K>>,
    {
        let mut set = Self::new();
        for record in records {
            if set.contains(record.key()) {
                return Err(CoreError::duplicate_identity(record.key()));
            }
            set.add(record);
        }
        Ok(set)
    }

    /// Returns the stored record with this key, if any.
    pub fn get(&self, key: &K) -> Option<&Record<K>> {
        self.records.get(key)
    }

    /// Returns a mutable reference to the stored record with this key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut Record<K>> {
        self.records.get_mut(key)
    }

    /// Inserts the record, replacing (and returning) a stored record with
    /// the same key. The replaced instance is discarded by the caller, not
    /// merged.
    pub fn add(&mut self, record: Record<K>) -> Option<Record<K>> {
        self.records.insert(record.key().clone(), record)
    }

    /// Removes and returns the record with this key, if present.
    pub fn pop(&mut self, key: &K) -> Option<Record<K>> {
        self.records.remove(key)
    }

    /// Returns whether a record with this key is present.
    pub fn contains(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    /// Empties the data set.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the data set is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Record<K>> {
        self.records.values()
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.records.keys()
    }

    /// Reconciles membership and content with the given iterable.
    ///
    /// Records present on both sides are content-synced in place, records
    /// only in the iterable are added, and members absent from the iterable
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateIdentity`] if the iterable contains two
    /// records with the same key; the data set is left untouched in that
    /// case.
    pub fn replace_all<I>(&mut self, records: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = Record<K>>,
    {
        let incoming = Self::from_records(records)?;

        let stale: Vec<K> = self
            .keys()
            .filter(|key| !incoming.contains(key))
            .cloned()
            .collect();
        for key in &stale {
            self.pop(key);
        }

        for record in incoming {
            if let Some(existing) = self.get_mut(record.key()) {
                existing.sync_from(&record);
            } else {
                self.add(record);
            }
        }
        Ok(())
    }
}

impl<K: NaturalKey> IntoIterator for DataSet<K> {
    type Item = Record<K>;
    type IntoIter = std::collections::btree_map::IntoValues<K, Record<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

impl<'a, K: NaturalKey> IntoIterator for &'a DataSet<K> {
    type Item = &'a Record<K>;
    type IntoIter = std::collections::btree_map::Values<'a, K, Record<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldSchema, FieldValue};

    const SCHEMA: FieldSchema = &["a"];

    fn record(key: u32, a: i64) -> Record<u32> {
        Record::new(key, SCHEMA).with_field("a", a).unwrap()
    }

    #[test]
    fn add_then_get_returns_identity_equal_record() {
        let mut set = DataSet::new();
        set.add(record(0, 1));

        assert_eq!(set.get(&0).unwrap().key(), &0);
        assert!(set.get(&1).is_none());
    }

    #[test]
    fn add_replaces_existing_record() {
        let mut set = DataSet::new();
        set.add(record(0, 1));
        let replaced = set.add(record(0, 2)).unwrap();

        assert_eq!(replaced.get("a"), Some(&FieldValue::Integer(1)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&0).unwrap().get("a"), Some(&FieldValue::Integer(2)));
    }

    #[test]
    fn pop_removes_and_returns() {
        let mut set = DataSet::new();
        set.add(record(0, 1));

        assert_eq!(set.pop(&0).unwrap().key(), &0);
        assert!(set.pop(&0).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn construction_preserves_duplicate_free_input() {
        let records = vec![record(2, 0), record(0, 0), record(1, 0)];
        let set = DataSet::from_records(records).unwrap();

        assert_eq!(set.len(), 3);
        // Iteration is in key order.
        let keys: Vec<u32> = set.keys().copied().collect();
        assert_eq!(keys, vec![0, 1, 2]);
    }

    #[test]
    fn construction_rejects_duplicates() {
        let records = vec![record(0, 1), record(0, 2)];
        let err = DataSet::from_records(records).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateIdentity { .. }));
    }

    #[test]
    fn replace_all_adds_updates_and_drops() {
        let mut set = DataSet::from_records(vec![record(0, 1), record(1, 1)]).unwrap();

        set.replace_all(vec![record(1, 99), record(3, 3)]).unwrap();

        let keys: Vec<u32> = set.keys().copied().collect();
        assert_eq!(keys, vec![1, 3]);
        assert_eq!(
            set.get(&1).unwrap().get("a"),
            Some(&FieldValue::Integer(99))
        );
    }

    #[test]
    fn replace_all_rejects_duplicates_without_mutating() {
        let mut set = DataSet::from_records(vec![record(0, 1)]).unwrap();

        let err = set
            .replace_all(vec![record(5, 1), record(5, 2)])
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateIdentity { .. }));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&0));
    }

    #[test]
    fn clear_empties() {
        let mut set = DataSet::from_records(vec![record(0, 1), record(1, 1)]).unwrap();
        set.clear();
        assert!(set.is_empty());
    }
}
