//! Shared conformance suite run against every backend (spec §8, property 6).
//!
//! `insert(k,r1,d1); insert(k,r2,d2); query(k,a,b)` must return exactly
//! those elements whose `r ∈ [a,b]` plus the `left(k,a)` element if
//! distinct, in ascending `r` order — identically across backends.

use bucketdb_core::Key;
use bucketdb_storage::{Backend, Store, StoreError};

fn key(s: &str) -> Key {
    Key::new(s).unwrap()
}

fn run_conformance(store: &dyn Store) {
    let k = key("conformance");

    store.insert(&k, 10, b"r10".to_vec()).unwrap();
    store.insert(&k, 20, b"r20".to_vec()).unwrap();
    store.insert(&k, 30, b"r30".to_vec()).unwrap();

    // insert conflicts on an existing range_key
    assert!(matches!(
        store.insert(&k, 20, b"dup".to_vec()),
        Err(StoreError::Conflict)
    ));

    // update requires an existing range_key
    assert!(matches!(
        store.update(&k, 99, b"nope".to_vec()),
        Err(StoreError::NotFound)
    ));
    store.update(&k, 20, b"r20-updated".to_vec()).unwrap();
    assert_eq!(store.get(&k, 20).unwrap(), b"r20-updated".to_vec());

    assert_eq!(store.first(&k).unwrap(), (10, b"r10".to_vec()));
    assert_eq!(store.last(&k).unwrap(), (30, b"r30".to_vec()));

    assert_eq!(store.left(&k, 25).unwrap().0, 20);
    assert_eq!(store.left(&k, 10).unwrap().0, 10);
    assert!(matches!(store.left(&k, 5), Err(StoreError::NotFound)));

    // query(k, 15, 30) must prepend left(k,15) = 10 since it isn't already first
    let q = store.query(&k, 15, 30).unwrap();
    let rks: Vec<u32> = q.iter().map(|(rk, _)| *rk).collect();
    assert_eq!(rks, vec![10, 20, 30]);

    // query(k, 10, 30) already starts at left(k,10) = 10, no duplicate prepend
    let q2 = store.query(&k, 10, 30).unwrap();
    let rks2: Vec<u32> = q2.iter().map(|(rk, _)| *rk).collect();
    assert_eq!(rks2, vec![10, 20, 30]);

    // an unrelated key never sees this key's rows
    let other = key("conformance-other");
    assert!(matches!(store.first(&other), Err(StoreError::NotFound)));
    assert_eq!(store.query(&other, 0, 100).unwrap(), Vec::new());
}

#[test]
fn memory_backend_is_conformant() {
    let backend = Backend::memory();
    run_conformance(&backend);
}

#[test]
fn sql_backend_is_conformant() {
    let backend = Backend::sql_in_memory().unwrap();
    run_conformance(&backend);
}

#[test]
fn wide_column_backend_is_conformant() {
    let backend = Backend::wide_column();
    run_conformance(&backend);
}

// Requires a live Redis instance; set BUCKETDB_TEST_REDIS_URL to exercise it.
#[test]
#[ignore]
fn kv_backend_is_conformant() {
    let Ok(url) = std::env::var("BUCKETDB_TEST_REDIS_URL") else {
        return;
    };
    let backend = Backend::kv(&url).unwrap();
    run_conformance(&backend);
}
