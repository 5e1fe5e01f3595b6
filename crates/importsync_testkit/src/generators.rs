//! Property-based test generators using proptest.

use proptest::prelude::*;

use importsync_core::{FieldValue, ImportStatus, Record};

use crate::fixtures;

/// Strategy for natural keys in a small, collision-friendly range.
pub fn key_strategy() -> impl Strategy<Value = u32> {
    0u32..128
}

/// Strategy for content field values.
pub fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Integer),
        "[a-z]{0,12}".prop_map(FieldValue::Text),
    ]
}

/// Strategy for statuses, including the unclassified state.
pub fn status_strategy() -> impl Strategy<Value = Option<ImportStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(ImportStatus::Imported)),
        Just(Some(ImportStatus::Forced)),
        Just(Some(ImportStatus::Invalid)),
    ]
}

/// Strategy for records over the fixture schema.
pub fn record_strategy() -> impl Strategy<Value = Record<u32>> {
    (key_strategy(), any::<i64>(), any::<i64>(), status_strategy()).prop_map(
        |(key, a, b, status)| {
            let record = fixtures::record(key, a, b);
            match status {
                Some(status) => record.with_status(status),
                None => record,
            }
        },
    )
}

/// Strategy for ascending, duplicate-free key vectors.
pub fn ascending_keys_strategy(max_len: usize) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::btree_set(key_strategy(), 0..=max_len)
        .prop_map(|keys| keys.into_iter().collect())
}

/// Strategy for an ascending, duplicate-free fixture record stream.
pub fn record_stream_strategy(max_len: usize) -> impl Strategy<Value = Vec<Record<u32>>> {
    ascending_keys_strategy(max_len).prop_map(fixtures::stream)
}
