use bucketdb::{Database, PointValue, Settings, StorageKind};

fn scalars(pairs: &[(u32, f32)]) -> Vec<(u32, PointValue)> {
    pairs.iter().map(|(ts, v)| (*ts, PointValue::F32(*v))).collect()
}

fn run_insert_and_query_sequence(storage: StorageKind) {
    let settings = Settings {
        dynamic_target: 3,
        dynamic_max: 5,
        storage,
        enable_events: false,
        ..Settings::default()
    };
    let db = Database::open(settings).unwrap();

    db.insert("parity", scalars(&[(1, 1.0), (2, 2.0), (3, 3.0)])).unwrap();
    db.insert("parity", scalars(&[(4, 4.0), (5, 5.0)])).unwrap();
    db.insert("parity", scalars(&[(0, 0.0)])).unwrap();

    let rs = db.query("parity", 0, 100).unwrap();
    assert_eq!(
        rs.all(),
        vec![
            (0, PointValue::F32(0.0)),
            (1, PointValue::F32(1.0)),
            (2, PointValue::F32(2.0)),
            (3, PointValue::F32(3.0)),
            (4, PointValue::F32(4.0)),
            (5, PointValue::F32(5.0)),
        ]
    );

    let trimmed = db.query("parity", 2, 4).unwrap();
    assert_eq!(
        trimmed.all(),
        vec![
            (2, PointValue::F32(2.0)),
            (3, PointValue::F32(3.0)),
            (4, PointValue::F32(4.0)),
        ]
    );
}

#[test]
fn memory_backend_matches_reference_sequence() {
    run_insert_and_query_sequence(StorageKind::Memory);
}

#[test]
fn embedded_sql_backend_matches_reference_sequence() {
    run_insert_and_query_sequence(StorageKind::EmbeddedSql(None));
}

#[test]
fn wide_column_backend_matches_reference_sequence() {
    run_insert_and_query_sequence(StorageKind::WideColumn);
}

// The sorted-set KV backend needs a live Redis instance; it is exercised
// by `bucketdb-storage`'s conformance suite behind `BUCKETDB_TEST_REDIS_URL`
// rather than here.
