use crate::common::*;
use auditkv::{Engine, EngineConfig};
use serde_json::json;

fn fill(collection: &auditkv::Collection, count: usize) {
    for i in 0..count {
        collection
            .indexer()
            .write_value(&json!({"id": format!("{:05}", i), "kind": "evt"}))
            .unwrap();
    }
}

#[test]
fn read_crosses_default_page_boundaries() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "kind"]);
    fill(&trail, 2100);

    let docs = trail.query().read("kind", "evt").unwrap();
    assert_eq!(docs.len(), 2100);

    // Index key order: ids ascending.
    let ids = field_values(&docs, "id");
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn page_size_does_not_change_results() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "kind"]);
    fill(&trail, 53);

    let expected = trail.query().read("id", "").unwrap();
    for size in [1, 2, 10, 52, 53, 54] {
        let docs = trail.query().with_page_size(size).read("id", "").unwrap();
        assert_eq!(docs, expected, "page size {}", size);
    }
}

#[test]
fn configured_page_size_is_used() {
    let mut config = EngineConfig::memory();
    config.query.scan_page_size = 4;
    let engine = Engine::open(config).unwrap();
    engine
        .create_collection(
            "trail",
            &auditkv::Schema::new(["id", "kind"]).unwrap(),
            auditkv::CollectionSettings::default(),
        )
        .unwrap();
    let trail = engine.open_collection("trail").unwrap();
    fill(&trail, 10);

    let first = trail.query().read_page("id", "", None).unwrap();
    assert_eq!(first.documents.len(), 4);
    assert!(!first.is_last());

    let mut pages = 1;
    let mut cursor = first.cursor;
    let mut seen = first.documents.len();
    while let Some(seek) = cursor {
        let page = trail.query().read_page("id", "", Some(&seek)).unwrap();
        seen += page.documents.len();
        cursor = page.cursor;
        pages += 1;
    }
    assert_eq!(seen, 10);
    // 4 + 4 + 2, then the empty page that ends the scan.
    assert_eq!(pages, 4);
}
