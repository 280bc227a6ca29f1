use crate::common::*;
use serde_json::json;
use std::thread;

const WRITERS: usize = 4;
const DOCS_PER_WRITER: usize = 50;

#[test]
fn every_document_is_reachable_through_every_index_after_concurrent_writes() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "writer", "seq"]);

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let trail = trail.clone();
            thread::spawn(move || {
                for i in 0..DOCS_PER_WRITER {
                    trail
                        .indexer()
                        .write_value(&json!({
                            "id": format!("{}-{:03}", w, i),
                            "writer": format!("w{}", w),
                            "seq": format!("{:03}", i),
                        }))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = WRITERS * DOCS_PER_WRITER;
    assert_eq!(trail.query().read("id", "").unwrap().len(), total);
    assert_eq!(trail.query().read("seq", "").unwrap().len(), total);
    for w in 0..WRITERS {
        let docs = trail.query().read("writer", &format!("w{}", w)).unwrap();
        assert_eq!(docs.len(), DOCS_PER_WRITER);
    }

    // Primary index, one secondary per field, payload.
    assert_eq!(t.key_count("trail."), total * 4);
    assert_eq!(t.engine.current_tx().as_u64() as usize, total + 1);
}

#[test]
fn each_document_write_is_one_transaction() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "user"]);
    let before = t.engine.current_tx().as_u64();

    let tx_a = trail.indexer().write(br#"{"id":"1","user":"a"}"#).unwrap();
    let tx_b = trail.indexer().write(br#"{"id":"2","user":"b"}"#).unwrap();

    assert_eq!(tx_a.as_u64(), before + 1);
    assert_eq!(tx_b.as_u64(), before + 2);
}
