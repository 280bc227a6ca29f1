use crate::common::*;
use serde_json::json;

#[test]
fn written_document_is_found_through_every_index() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "user", "action"]);

    let document = br#"{"id":"42","user":"bob","action":"login","extra":{"ip":"10.0.0.1"}}"#;
    trail.indexer().write(document).unwrap();

    for (field, condition) in [("id", "42"), ("user", "bo"), ("action", "log"), ("id", "")] {
        let docs = trail.query().read(field, condition).unwrap();
        assert_eq!(docs, vec![document.to_vec()], "read by {}", field);
    }
}

#[test]
fn payload_bytes_are_stored_verbatim() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id"]);

    // Whitespace and key order are not normalized.
    let document = b"{ \"z\": 1,  \"id\": \"a\" }";
    trail.indexer().write(document).unwrap();

    let history = trail.history().history("a").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].entry, document.to_vec());
}

#[test]
fn non_string_field_values_are_indexed_by_their_text() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "code", "ok"]);

    trail
        .indexer()
        .write_value(&json!({"id": 7, "code": 404, "ok": false}))
        .unwrap();

    assert_eq!(trail.query().read("id", "7").unwrap().len(), 1);
    assert_eq!(trail.query().read("code", "40").unwrap().len(), 1);
    assert_eq!(trail.query().read("ok", "false").unwrap().len(), 1);
    assert_eq!(trail.history().history("7").unwrap().len(), 1);
}

#[test]
fn prefix_condition_filters_documents() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "user"]);

    for (id, user) in [("1", "bob"), ("2", "bobby"), ("3", "alice")] {
        trail
            .indexer()
            .write_value(&json!({"id": id, "user": user}))
            .unwrap();
    }

    let docs = trail.query().read("user", "bob").unwrap();
    let mut ids = field_values(&docs, "id");
    ids.sort();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(trail.query().read("user", "carol").unwrap().is_empty());
}

#[test]
fn collections_do_not_see_each_other() {
    let t = TestEngine::memory();
    let a = t.collection("a", &["id"]);
    let b = t.collection("b", &["id"]);

    a.indexer().write(br#"{"id":"1"}"#).unwrap();
    assert_eq!(a.query().read("id", "").unwrap().len(), 1);
    assert!(b.query().read("id", "").unwrap().is_empty());
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_field_values_round_trip(
        id in "[a-z0-9]{1,12}",
        user in "[a-zA-Z0-9 _-]{0,16}",
        note in ".{0,40}",
    ) {
        let t = TestEngine::memory();
        let trail = t.collection("trail", &["id", "user"]);
        let document = serde_json::to_vec(&json!({"id": id, "user": user, "note": note})).unwrap();
        trail.indexer().write(&document).unwrap();

        let by_user = trail.query().read("user", &user).unwrap();
        proptest::prop_assert!(by_user.contains(&document));
        let by_id = trail.query().read("id", &id).unwrap();
        proptest::prop_assert_eq!(by_id, vec![document.clone()]);
    }
}
