use bucketdb::{BucketSizing, Database, PointValue, Settings, StorageKind};

fn settings(target: usize, max: usize) -> Settings {
    Settings {
        bucket_type: BucketSizing::Dynamic,
        dynamic_target: target,
        dynamic_max: max,
        storage: StorageKind::Memory,
        enable_events: false,
        ..Settings::default()
    }
}

fn scalars(pairs: &[(u32, f32)]) -> Vec<(u32, PointValue)> {
    pairs.iter().map(|(ts, v)| (*ts, PointValue::F32(*v))).collect()
}

/// target=3, max=3: two points append, a third appends and hits the soft
/// threshold exactly, then an out-of-order point forces the merge path
/// into the same bucket.
#[test]
fn append_path_builds_tail_then_merge_path_inserts_in_place() {
    let db = Database::open(settings(3, 3)).unwrap();

    db.insert("ph", scalars(&[(1, 1.1), (2, 2.2)])).unwrap();
    let stats = db.insert("ph", scalars(&[(4, 4.4)])).unwrap();
    assert_eq!(stats.appended, 1);
    assert_eq!(stats.inserted, 0);

    let before = db.query("ph", 0, 100).unwrap();
    assert_eq!(before.all().len(), 3);

    let stats = db.insert("ph", scalars(&[(3, 3.3)])).unwrap();
    assert_eq!(stats.inserted, 1);

    let after = db.query("ph", 0, 100).unwrap();
    let tss: Vec<u32> = after.all().iter().map(|(ts, _)| *ts).collect();
    assert_eq!(tss, vec![1, 2, 3, 4]);
}

/// target=2, max=2: a full bucket forces a split on append, then a batch
/// spanning both fragments exercises the merge path's right-to-left scan.
/// Each value is `timestamp + 1.0`, checked after every mutation.
#[test]
fn merge_path_preserves_value_identity_across_fragments() {
    let db = Database::open(settings(2, 2)).unwrap();

    let points: Vec<(u32, f32)> = (0..6u32).map(|ts| (ts, ts as f32 + 1.0)).collect();
    db.insert("series", scalars(&points)).unwrap();

    let result = db.query("series", 0, 100).unwrap();
    for (ts, value) in result.all() {
        assert_eq!(value, PointValue::F32(ts as f32 + 1.0));
    }
    assert_eq!(result.len(), 6);

    // a duplicate timestamp landing inside an earlier fragment is a no-op:
    // inserts default to first-write-wins.
    let stats = db.insert("series", scalars(&[(1, 42.0)])).unwrap();
    assert_eq!(stats.inserted, 0);
    let unchanged = db.query("series", 0, 100).unwrap();
    let value_at_1 = unchanged
        .all()
        .into_iter()
        .find(|(ts, _)| *ts == 1)
        .map(|(_, v)| v)
        .unwrap();
    assert_eq!(value_at_1, PointValue::F32(2.0));
}

/// A genuinely new timestamp landing inside an earlier, non-tail fragment
/// exercises the merge path's actual write (not just duplicate detection).
#[test]
fn merge_path_writes_a_new_point_into_a_non_tail_fragment() {
    let db = Database::open(settings(2, 2)).unwrap();
    let evens: Vec<(u32, f32)> = (0..6u32).map(|i| (i * 2, i as f32)).collect();
    db.insert("gapped", scalars(&evens)).unwrap();
    // fragments are [0,2],[4,6],[8,10]; 5 falls inside the middle fragment
    let stats = db.insert("gapped", scalars(&[(5, 99.0)])).unwrap();
    assert_eq!(stats.inserted, 1);

    let rs = db.query("gapped", 0, 100).unwrap();
    let value_at_5 = rs.all().into_iter().find(|(ts, _)| *ts == 5).map(|(_, v)| v);
    assert_eq!(value_at_5, Some(PointValue::F32(99.0)));
    assert_eq!(rs.len(), 7);
}

#[test]
fn duplicate_batch_reports_zero_writes_and_skips_commit() {
    let db = Database::open(settings(100, 200)).unwrap();
    db.insert("k", scalars(&[(1, 1.0), (2, 2.0), (3, 3.0)])).unwrap();
    let stats = db.insert("k", scalars(&[(1, 1.0), (2, 2.0), (3, 3.0)])).unwrap();
    assert_eq!(stats.appended, 0);
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.updated, 0);
    assert_eq!(stats.splits, 0);
}
