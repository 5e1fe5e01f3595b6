//! Record fixtures over a shared test schema.

use importsync_core::{FieldSchema, ImportStatus, Record};

/// The content schema used by fixture records.
pub const CONTENT: FieldSchema = &["a", "b"];

/// Builds a fixture record with both content fields set.
pub fn record(key: u32, a: i64, b: i64) -> Record<u32> {
    Record::new(key, CONTENT)
        .with_field("a", a)
        .expect("fixture schema has field a")
        .with_field("b", b)
        .expect("fixture schema has field b")
}

/// Builds a fixture record with a status tag.
pub fn record_with_status(key: u32, a: i64, b: i64, status: ImportStatus) -> Record<u32> {
    record(key, a, b).with_status(status)
}

/// Builds an ascending stream of fixture records for the given keys.
///
/// Content derives from the key so that equal keys carry equal content.
pub fn stream(keys: impl IntoIterator<Item = u32>) -> Vec<Record<u32>> {
    keys.into_iter()
        .map(|key| record(key, i64::from(key), 2 * i64::from(key)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_content_is_key_derived() {
        let records = stream([1, 2]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record(1, 1, 2));
        assert_ne!(records[0], records[1]);
    }
}
