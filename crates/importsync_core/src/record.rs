//! The record model: identity, content fields and change notification.
//!
//! A [`Record`] is the unit of synchronization. It is composed of:
//!
//! - A *natural key* identifying *the same* element across systems. Two
//!   records with equal keys are the same record regardless of content;
//!   equality, ordering and hashing are derived solely from the key.
//! - A fixed set of named *content fields* (the [`FieldSchema`]) whose
//!   values are carried across systems when records are synchronized.
//! - An optional [`ImportStatus`] used by the status-aware reconciliation
//!   policy.
//! - A set of registered listeners notified whenever a content field (or the
//!   status) changes to a value unequal to the previous one.
//!
//! Two records that are the same and have equal content are *in sync*.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};

/// Status tag driving the reconciliation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    /// The record was imported from (and is vouched for by) the source feed.
    Imported,
    /// The record is authoritative in the destination regardless of source
    /// presence; protected from deletion and converted back to `Imported`
    /// once the source confirms it.
    Forced,
    /// The record failed validation; kept only while the source still
    /// vouches for it.
    Invalid,
}

/// The value of a single content field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A text value.
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The fixed set of content field names recognized by a record type.
pub type FieldSchema = &'static [&'static str];

/// Marker bounds for natural keys.
///
/// A natural key must be hashable and totally ordered, and it must be
/// shareable with the change hooks a diff-tracking set installs.
pub trait NaturalKey: Clone + Ord + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + Ord + Hash + fmt::Debug + Send + Sync + 'static> NaturalKey for T {}

/// A change listener invoked with the record after a mutating change.
pub type Listener<K> = Arc<dyn Fn(&Record<K>) + Send + Sync>;

/// An importable record.
///
/// The key is immutable for the lifetime of the record; content fields are
/// mutated through [`set`](Record::set), [`update`](Record::update) and
/// [`sync_from`](Record::sync_from), all of which notify registered
/// listeners when (and only when) a value actually changed.
pub struct Record<K: NaturalKey> {
    key: K,
    status: Option<ImportStatus>,
    schema: FieldSchema,
    content: BTreeMap<&'static str, FieldValue>,
    listeners: Vec<Listener<K>>,
}

impl<K: NaturalKey> Record<K> {
    /// Creates a record with no content and no status.
    pub fn new(key: K, schema: FieldSchema) -> Self {
        Self {
            key,
            status: None,
            schema,
            content: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Sets the status during construction.
    #[must_use]
    pub fn with_status(mut self, status: ImportStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets a content field during construction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] if the field is not part of the
    /// content schema.
    pub fn with_field(
        mut self,
        field: &'static str,
        value: impl Into<FieldValue>,
    ) -> CoreResult<Self> {
        self.set(field, value.into())?;
        Ok(self)
    }

    /// Returns the natural key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the content schema.
    pub fn schema(&self) -> FieldSchema {
        self.schema
    }

    /// Returns the status, if classified.
    pub fn status(&self) -> Option<ImportStatus> {
        self.status
    }

    /// Returns the value of a content field, if set.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.content.get(field)
    }

    /// Iterates over the content fields that currently hold a value.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.content.iter().map(|(name, value)| (*name, value))
    }

    fn in_schema(&self, field: &str) -> bool {
        self.schema.contains(&field)
    }

    /// Sets a content field, notifying listeners iff the value changed.
    ///
    /// A missing previous value counts as unequal. Returns whether the
    /// value changed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] if the field is not part of the
    /// content schema.
    pub fn set(&mut self, field: &'static str, value: impl Into<FieldValue>) -> CoreResult<bool> {
        if !self.in_schema(field) {
            return Err(CoreError::unknown_field(field));
        }
        let changed = self.apply(vec![(field, value.into())]);
        if changed {
            self.notify();
        }
        Ok(changed)
    }

    /// Applies multiple field assignments with at most one notification.
    ///
    /// All field names are validated before anything is assigned, so a
    /// rejected call leaves the record untouched. Returns whether anything
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] on the first field outside the
    /// content schema.
    pub fn update<I>(&mut self, pairs: I) -> CoreResult<bool>
    where
        I: IntoIterator<Item = (&'static str, FieldValue)>,
    {
        let pairs: Vec<_> = pairs.into_iter().collect();
        for (field, _) in &pairs {
            if !self.in_schema(field) {
                return Err(CoreError::unknown_field(*field));
            }
        }
        let changed = self.apply(pairs);
        if changed {
            self.notify();
        }
        Ok(changed)
    }

    /// Copies every own-schema field present on `other` onto this record.
    ///
    /// Fields `other` does not carry are skipped; fields outside this
    /// record's schema are never touched. Fires exactly one notification if
    /// anything changed. Returns whether anything changed.
    ///
    /// With an empty schema this is a no-op reporting unchanged.
    pub fn sync_from(&mut self, other: &Record<K>) -> bool {
        let pairs: Vec<_> = self
            .schema
            .iter()
            .filter_map(|field| other.content.get(field).map(|value| (*field, value.clone())))
            .collect();
        let changed = self.apply(pairs);
        if changed {
            self.notify();
        }
        changed
    }

    fn apply(&mut self, pairs: Vec<(&'static str, FieldValue)>) -> bool {
        let mut changed = false;
        for (field, value) in pairs {
            if !changed && self.content.get(field) != Some(&value) {
                changed = true;
            }
            self.content.insert(field, value);
        }
        changed
    }

    /// Sets the status, notifying listeners iff it actually changed.
    ///
    /// Status transitions go through the notification path so that a
    /// diff-tracking set observes them; content is never touched.
    pub fn set_status(&mut self, status: Option<ImportStatus>) -> bool {
        let changed = self.status != status;
        self.status = status;
        if changed {
            self.notify();
        }
        changed
    }

    /// Registers a change listener.
    ///
    /// Registration is idempotent: registering the same listener (by
    /// pointer identity) twice does not cause double notification.
    pub fn register(&mut self, listener: Listener<K>) {
        if !self.is_registered(&listener) {
            self.listeners.push(listener);
        }
    }

    /// Returns whether the listener is already registered.
    pub fn is_registered(&self, listener: &Listener<K>) -> bool {
        self.listeners.iter().any(|l| Arc::ptr_eq(l, listener))
    }

    /// Invokes every registered listener with this record.
    pub fn notify(&self) {
        for listener in &self.listeners {
            listener(self);
        }
    }
}

impl<K: NaturalKey> Clone for Record<K> {
    /// Clones the record's value, not its observers.
    ///
    /// Listeners watch one concrete instance; a clone starts with none.
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            schema: self.schema,
            content: self.content.clone(),
            listeners: Vec::new(),
        }
    }
}

impl<K: NaturalKey> PartialEq for Record<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: NaturalKey> Eq for Record<K> {}

impl<K: NaturalKey> PartialOrd for Record<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: NaturalKey> Ord for Record<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl<K: NaturalKey> Hash for Record<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<K: NaturalKey> fmt::Debug for Record<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("key", &self.key)
            .field("status", &self.status)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}
