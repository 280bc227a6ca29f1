use crate::common::*;
use std::io::Write;

#[test]
fn collections_and_documents_survive_reopen() {
    let t = TestEngine::durable();
    let trail = t.collection("trail", &["id", "user"]);
    trail.indexer().write(br#"{"id":"1","user":"a"}"#).unwrap();
    trail.indexer().write(br#"{"id":"1","user":"b"}"#).unwrap();
    let tx = t.engine.current_tx();
    drop(trail);

    let t = t.reopen();
    assert_eq!(t.engine.current_tx(), tx);
    assert_eq!(t.engine.list_collections().unwrap(), vec!["trail".to_string()]);

    let trail = t.engine.open_collection("trail").unwrap();
    let history = trail.history().history("1").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].tx_id, tx);

    // Writes continue after the replayed transaction.
    let next = trail.indexer().write(br#"{"id":"2","user":"c"}"#).unwrap();
    assert_eq!(next.as_u64(), tx.as_u64() + 1);
}

#[test]
fn torn_commit_log_tail_is_dropped() {
    let t = TestEngine::durable();
    let trail = t.collection("trail", &["id"]);
    trail.indexer().write(br#"{"id":"1"}"#).unwrap();
    drop(trail);

    let log = t
        .dir
        .as_ref()
        .unwrap()
        .path()
        .join(auditkv_storage::commit_log::LOG_FILE_NAME);
    let mut file = std::fs::OpenOptions::new().append(true).open(&log).unwrap();
    file.write_all(&[0x10, 0x00]).unwrap();
    drop(file);

    let t = t.reopen();
    let trail = t.engine.open_collection("trail").unwrap();
    assert_eq!(trail.query().read("id", "").unwrap().len(), 1);
}
