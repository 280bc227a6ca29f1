use crate::common::*;
use auditkv::Error;

#[test]
fn missing_primary_key_field_writes_nothing() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "user"]);

    let err = trail.indexer().write(br#"{"user":"bob"}"#).unwrap_err();
    assert!(matches!(err, Error::MissingPrimaryKeyField { .. }));
    assert!(err.is_validation());
    assert_eq!(t.key_count("trail."), 0);
}

#[test]
fn missing_secondary_field_writes_nothing() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id", "user", "action"]);
    let before = t.engine.current_tx();

    let err = trail
        .indexer()
        .write(br#"{"id":"1","user":"bob"}"#)
        .unwrap_err();
    assert!(matches!(err, Error::MissingSecondaryKeyField { .. }));
    assert_eq!(t.key_count("trail."), 0);
    assert_eq!(t.engine.current_tx(), before);
}

#[test]
fn non_object_documents_are_rejected() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["id"]);

    let documents: [&[u8]; 3] = [b"[1,2]", b"\"id\"", b"not json"];
    for document in documents {
        let err = trail.indexer().write(document).unwrap_err();
        assert!(err.is_validation(), "{:?}", err);
    }
    assert_eq!(t.key_count("trail."), 0);
}

#[test]
fn unknown_collection_is_a_configuration_error() {
    let t = TestEngine::memory();
    let err = t.engine.open_collection("nope").unwrap_err();
    assert!(matches!(err, Error::NotConfigured { .. }));
    assert!(err.is_configuration());
}

#[test]
fn reserved_delimiters_are_rejected_in_names() {
    let t = TestEngine::memory();
    let schema = auditkv::Schema::new(["id"]).unwrap();
    for name in ["a.b", "a{b", "a}b", "_hidden"] {
        assert!(t
            .engine
            .create_collection(name, &schema, auditkv::CollectionSettings::default())
            .is_err());
    }
    assert!(auditkv::Schema::new(["id", "a.b"]).is_err());
}
