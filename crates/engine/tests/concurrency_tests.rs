//! Multi-Threaded Indexing Tests
//!
//! Concurrent writers on one collection, and on several collections at
//! once, must leave complete indexes with no dangling entries.

use auditkv_core::{CollectionSettings, Schema};
use auditkv_engine::{Collection, Engine};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn create(engine: &Engine, name: &str) -> Collection {
    engine
        .create_collection(
            name,
            &Schema::new(["id", "team", "level"]).unwrap(),
            CollectionSettings::default(),
        )
        .unwrap();
    engine.open_collection(name).unwrap()
}

fn id_set(docs: &[Vec<u8>]) -> BTreeSet<String> {
    docs.iter()
        .map(|d| {
            let v: serde_json::Value = serde_json::from_slice(d).unwrap();
            v["id"].as_str().unwrap().to_string()
        })
        .collect()
}

// ============================================================================
// Single Collection
// ============================================================================

/// Test: N threads write distinct documents; every secondary scan is exact
#[test]
fn test_concurrent_writes_index_completeness() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 40;

    let engine = Engine::memory();
    let trail = create(&engine, "trail");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let trail = trail.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let team = if t % 2 == 0 { "red" } else { "blue" };
                    trail
                        .indexer()
                        .write_value(&json!({
                            "id": format!("t{}-{:03}", t, i),
                            "team": team,
                            "level": i % 3,
                        }))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let all = trail.query().read("id", "").unwrap();
    assert_eq!(all.len(), THREADS * PER_THREAD);

    let red = id_set(&trail.query().read("team", "red").unwrap());
    let expected_red: BTreeSet<String> = (0..THREADS)
        .filter(|t| t % 2 == 0)
        .flat_map(|t| (0..PER_THREAD).map(move |i| format!("t{}-{:03}", t, i)))
        .collect();
    assert_eq!(red, expected_red);

    let level_zero = trail.query().read("level", "0").unwrap();
    let per_thread_zero = (0..PER_THREAD).filter(|i| i % 3 == 0).count();
    assert_eq!(level_zero.len(), THREADS * per_thread_zero);
}

/// Test: concurrent rewrites of one document produce one revision each
#[test]
fn test_concurrent_rewrites_history() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let engine = Engine::memory();
    let trail = create(&engine, "trail");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let trail = trail.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    trail
                        .indexer()
                        .write_value(&json!({"id": "shared", "team": format!("w{}", t), "level": i}))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let records = trail.history().history("shared").unwrap();
    assert_eq!(records.len(), THREADS * PER_THREAD);
    assert!(records
        .windows(2)
        .all(|w| w[0].revision + 1 == w[1].revision && w[0].tx_id < w[1].tx_id));

    // The primary index still holds exactly one entry for the document.
    assert_eq!(trail.query().read("id", "shared").unwrap().len(), 1);
}

// ============================================================================
// Multiple Collections
// ============================================================================

/// Test: collections opened side by side do not see each other's documents
#[test]
fn test_collections_are_isolated() {
    let engine = Engine::memory();
    let a = create(&engine, "alpha");
    let b = create(&engine, "beta");

    let ha = {
        let a = a.clone();
        thread::spawn(move || {
            for i in 0..50 {
                a.indexer()
                    .write_value(&json!({"id": format!("a{}", i), "team": "x", "level": 1}))
                    .unwrap();
            }
        })
    };
    let hb = {
        let b = b.clone();
        thread::spawn(move || {
            for i in 0..30 {
                b.indexer()
                    .write_value(&json!({"id": format!("b{}", i), "team": "x", "level": 1}))
                    .unwrap();
            }
        })
    };
    ha.join().unwrap();
    hb.join().unwrap();

    assert_eq!(a.query().read("team", "x").unwrap().len(), 50);
    assert_eq!(b.query().read("team", "x").unwrap().len(), 30);
    assert_eq!(engine.list_collections().unwrap(), vec!["alpha", "beta"]);
}
