use crate::common::*;
use serde_json::json;

#[test]
fn revisions_come_back_oldest_first_with_increasing_transactions() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "state"]);

    for (i, state) in ["open", "pending", "closed"].iter().enumerate() {
        trail
            .indexer()
            .write_value(&json!({"id": "t-1", "state": state, "n": i}))
            .unwrap();
        // Interleave an unrelated document.
        trail
            .indexer()
            .write_value(&json!({"id": format!("other-{}", i), "state": "x"}))
            .unwrap();
    }

    let history = trail.history().history("t-1").unwrap();
    assert_eq!(history.len(), 3);
    let states: Vec<String> = history
        .iter()
        .map(|r| parse(&r.entry)["state"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(states, vec!["open", "pending", "closed"]);

    for (i, record) in history.iter().enumerate() {
        assert_eq!(record.revision, i as u64 + 1);
    }
    assert!(history.windows(2).all(|w| w[0].tx_id < w[1].tx_id));
}

#[test]
fn history_spans_several_pages() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id"]);

    // More than two default history pages.
    for n in 0..250 {
        trail
            .indexer()
            .write_value(&json!({"id": "k", "n": n}))
            .unwrap();
    }

    let history = trail.history().history("k").unwrap();
    assert_eq!(history.len(), 250);
    assert_eq!(parse(&history[0].entry)["n"], 0);
    assert_eq!(parse(&history[249].entry)["n"], 249);

    let small_pages = trail.history().with_page_size(7).history("k").unwrap();
    assert_eq!(small_pages, history);
}

#[test]
fn rewrite_shows_latest_document_in_reads() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "user"]);

    trail.indexer().write(br#"{"id":"1","user":"ann"}"#).unwrap();
    trail.indexer().write(br#"{"id":"1","user":"ann","v":2}"#).unwrap();

    let docs = trail.query().read("user", "ann").unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(parse(&docs[0])["v"], 2);
}

#[test]
fn unknown_primary_key_has_empty_history() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id"]);
    assert!(trail.history().history("missing").unwrap().is_empty());
}
