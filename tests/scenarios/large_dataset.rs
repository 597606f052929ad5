use bucketdb::{BucketSizing, Database, PointValue, Settings, StorageKind};
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn settings() -> Settings {
    Settings {
        bucket_type: BucketSizing::Dynamic,
        dynamic_target: 100,
        dynamic_max: 150,
        storage: StorageKind::Memory,
        enable_events: false,
        ..Settings::default()
    }
}

/// 50,000 points inserted across a shuffled sequence of batches (some
/// contiguous appends, some scattered back-fills) converge to the full,
/// deduplicated, ascending series with a bucket count that tracks the
/// dynamic target.
#[test]
fn fifty_thousand_points_in_shuffled_batches_converge_to_one_sorted_series() {
    let db = Database::open(settings()).unwrap();

    let mut timestamps: Vec<u32> = (0..50_000u32).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(1337);
    timestamps.shuffle(&mut rng);

    for chunk in timestamps.chunks(200) {
        let batch: Vec<(u32, PointValue)> = chunk
            .iter()
            .map(|&ts| (ts, PointValue::F32(ts as f32)))
            .collect();
        db.insert("large-series", batch).unwrap();
    }

    let rs = db.query("large-series", 0, u32::MAX).unwrap();
    assert_eq!(rs.len(), 50_000);
    let all = rs.all();
    for (i, (ts, value)) in all.iter().enumerate() {
        assert_eq!(*ts, i as u32);
        assert_eq!(*value, PointValue::F32(i as f32));
    }
}

#[test]
fn repeated_out_of_order_patches_do_not_lose_points() {
    let db = Database::open(settings()).unwrap();
    let points: Vec<(u32, PointValue)> = (0..50_000u32)
        .map(|ts| (ts, PointValue::F32(ts as f32)))
        .collect();
    for chunk in points.chunks(5_000) {
        db.insert("patched-series", chunk.to_vec()).unwrap();
    }
    // re-inserting a scattered subset is a no-op: every timestamp already
    // has a first-seen value.
    let patch: Vec<(u32, PointValue)> = (0..50_000u32)
        .step_by(7)
        .map(|ts| (ts, PointValue::F32(-1.0)))
        .collect();
    let stats = db.insert("patched-series", patch).unwrap();
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.appended, 0);

    let rs = db.query("patched-series", 0, u32::MAX).unwrap();
    assert_eq!(rs.len(), 50_000);
}
