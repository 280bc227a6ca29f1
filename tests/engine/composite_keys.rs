use crate::common::*;

#[test]
fn composite_key_reads_by_its_specification() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["host+pid", "user"]);

    trail
        .indexer()
        .write(br#"{"host":"db1","pid":"42","user":"bob"}"#)
        .unwrap();

    let docs = trail.query().read("host+pid", "db1").unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(trail.history().history("db142").unwrap().len(), 1);
}

#[test]
fn undelimited_composite_parts_collide() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["a+b"]);

    trail.indexer().write(br#"{"a":"ab","b":"c","n":1}"#).unwrap();
    trail.indexer().write(br#"{"a":"a","b":"bc","n":2}"#).unwrap();

    // Both concatenate to "abc": the second write is a new revision.
    let docs = trail.query().read("a+b", "").unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(parse(&docs[0])["n"], 2);

    let history = trail.history().history("abc").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(parse(&history[0].entry)["n"], 1);
}

#[test]
fn composite_key_needs_every_part() {
    let t = TestEngine::memory();
    let trail = t.collection("trail", &["a+b"]);

    let err = trail.indexer().write(br#"{"a":"x"}"#).unwrap_err();
    assert!(matches!(err, auditkv::Error::MissingPrimaryKeyField { .. }));
}
