//! End-to-end reconciliation runs through the public engine surface.

use importsync_core::{DataSet, DiffDataSet, FieldValue, ImportStatus, MergeChunks, Record};
use importsync_engine::{
    additive_sync, full_sync, BufferedLoader, ChunkedSync, SyncMode, SyncOptions, VecSource,
};
use importsync_testkit::fixtures;

fn imported(key: u32, a: i64, b: i64) -> Record<u32> {
    fixtures::record(key, a, b).with_status(ImportStatus::Imported)
}

#[test]
fn chunker_pairs_interleaved_streams() {
    let left = vec![10, 20, 30, 40, 50, 60];
    let right = vec![15, 25, 35, 45, 55, 65];

    let chunks: Vec<_> = MergeChunks::new(left.into_iter(), right.into_iter(), 5)
        .unwrap()
        .collect();

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], (vec![10, 20, 30], vec![15, 25]));
    assert_eq!(chunks[1], (vec![40, 50], vec![35, 45, 55]));
    assert_eq!(chunks[2], (vec![60], vec![65]));
}

#[test]
fn chunker_extends_past_the_hint_to_keep_runs_together() {
    let left = vec![1, 2, 3, 4, 5];
    let right = vec![5, 6];

    let chunks: Vec<_> = MergeChunks::new(left.into_iter(), right.into_iter(), 5)
        .unwrap()
        .collect();

    // The run of 5s straddles the hint boundary and must land in one chunk.
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], (vec![1, 2, 3, 4, 5], vec![5]));
    assert_eq!(chunks[1], (vec![], vec![6]));
}

#[test]
fn additive_update_is_tracked_as_changed_only() {
    let mut source_record = imported(7, 0, 0);
    source_record.set("a", 42i64).unwrap();
    let source = DataSet::from_records(vec![source_record]).unwrap();
    let mut destination = DiffDataSet::from_records(vec![imported(7, 0, 0)]).unwrap();

    additive_sync(&source, &mut destination);

    let record = destination.get(&7).unwrap();
    assert_eq!(record.get("a"), Some(&FieldValue::Integer(42)));
    let changed: Vec<u32> = destination.changed().map(|r| *r.key()).collect();
    assert_eq!(changed, vec![7]);
    assert_eq!(destination.added().count(), 0);
    assert_eq!(destination.removed().count(), 0);
}

#[test]
fn full_sync_applies_the_status_policy_across_a_mixed_destination() {
    let source = DataSet::from_records(vec![imported(1, 1, 1), imported(2, 2, 2)]).unwrap();
    let mut destination = DiffDataSet::from_records(vec![
        imported(2, 0, 0),
        fixtures::record(3, 3, 3).with_status(ImportStatus::Forced),
        imported(4, 4, 4),
    ])
    .unwrap();

    full_sync(&source, &mut destination, &SyncOptions::default());

    // 1 arrives as Imported, 2 is updated, 3 survives on Forced, 4 is stale.
    assert_eq!(
        destination.get(&1).unwrap().status(),
        Some(ImportStatus::Imported)
    );
    assert_eq!(
        destination.get(&2).unwrap().get("a"),
        Some(&FieldValue::Integer(2))
    );
    assert_eq!(
        destination.get(&3).unwrap().status(),
        Some(ImportStatus::Forced)
    );
    assert!(!destination.contains(&4));

    let added: Vec<u32> = destination.added().map(|r| *r.key()).collect();
    let removed: Vec<u32> = destination.removed().map(|r| *r.key()).collect();
    let changed: Vec<u32> = destination.changed().map(|r| *r.key()).collect();
    assert_eq!(added, vec![1]);
    assert_eq!(removed, vec![4]);
    assert_eq!(changed, vec![2]);
}

#[test]
fn chunked_run_converges_and_reports_totals() {
    let source: Vec<_> = (0u32..100).map(|k| imported(k, i64::from(k), 0)).collect();
    let destination: Vec<_> = (50u32..150).map(|k| imported(k, 0, 0)).collect();

    let driver = ChunkedSync::new(SyncOptions::new().chunk_hint(16));
    let mut survivors: Vec<u32> = Vec::new();
    let report = driver
        .run(source, destination, |_, diff| {
            survivors.extend(diff.iter().map(|r| *r.key()));
            Ok(())
        })
        .unwrap();

    assert_eq!(report.added, 50);
    assert_eq!(report.removed, 50);
    assert_eq!(report.changed, 50);

    survivors.sort_unstable();
    assert_eq!(survivors, (0u32..100).collect::<Vec<_>>());
}

#[test]
fn rerunning_a_converged_import_is_a_no_op() {
    let source: Vec<_> = (0u32..30).map(|k| imported(k, i64::from(k), 0)).collect();
    let destination = source.clone();

    let driver = ChunkedSync::new(SyncOptions::new().chunk_hint(8));
    let report = driver.run(source, destination, |_, _| Ok(())).unwrap();

    assert_eq!(report.added, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(report.changed, 0);
}

#[test]
fn additive_chunked_run_keeps_stale_destination_records() {
    let source: Vec<_> = (0u32..10).map(|k| imported(k, 1, 1)).collect();
    let destination: Vec<_> = (8u32..20).map(|k| imported(k, 1, 1)).collect();

    let driver = ChunkedSync::new(SyncOptions::new().mode(SyncMode::Additive).chunk_hint(6));
    let mut seen: Vec<u32> = Vec::new();
    let report = driver
        .run(source, destination, |_, diff| {
            seen.extend(diff.iter().map(|r| *r.key()));
            Ok(())
        })
        .unwrap();

    assert_eq!(report.added, 8);
    assert_eq!(report.removed, 0);
    seen.sort_unstable();
    assert_eq!(seen, (0u32..20).collect::<Vec<_>>());
}

mod properties {
    use super::*;
    use importsync_testkit::generators;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn full_sync_converges_to_source_membership(
            source in generators::record_stream_strategy(40),
            destination in generators::record_stream_strategy(40),
            hint in 1usize..16,
        ) {
            let source_keys: Vec<u32> = source.iter().map(|r| *r.key()).collect();
            let destination_keys: Vec<u32> =
                destination.iter().map(|r| *r.key()).collect();

            let driver = ChunkedSync::new(SyncOptions::new().chunk_hint(hint));
            let mut survivors: Vec<u32> = Vec::new();
            let report = driver
                .run(source, destination, |_, diff| {
                    survivors.extend(diff.iter().map(|r| *r.key()));
                    Ok(())
                })
                .unwrap();

            survivors.sort_unstable();
            prop_assert_eq!(&survivors, &source_keys);

            let added = source_keys
                .iter()
                .filter(|k| !destination_keys.contains(k))
                .count() as u64;
            let removed = destination_keys
                .iter()
                .filter(|k| !source_keys.contains(k))
                .count() as u64;
            prop_assert_eq!(report.added, added);
            prop_assert_eq!(report.removed, removed);
            // Fixture content derives from the key, so shared records are
            // already in sync.
            prop_assert_eq!(report.changed, 0);
        }
    }
}

#[test]
fn buffered_loader_feeds_a_chunked_run() {
    let backing: Vec<_> = (0u32..40).map(|k| imported(k, i64::from(k), 0)).collect();
    let loader = BufferedLoader::new(VecSource::new(backing), 7).unwrap();
    let source: Vec<_> = loader
        .records()
        .collect::<Result<_, _>>()
        .expect("vec source never fails");

    let destination: Vec<_> = (20u32..40).map(|k| imported(k, 0, 0)).collect();

    let driver = ChunkedSync::new(SyncOptions::new().chunk_hint(10));
    let report = driver.run(source, destination, |_, _| Ok(())).unwrap();

    assert_eq!(report.added, 20);
    assert_eq!(report.removed, 0);
    assert_eq!(report.changed, 20);
}
