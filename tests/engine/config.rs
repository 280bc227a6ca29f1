use auditkv::{Engine, EngineConfig, Error, StorageMode};
use tempfile::TempDir;

#[test]
fn engine_opens_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("auditkv.toml");
    std::fs::write(
        &path,
        "[storage]\nmode = \"memory\"\n\n[query]\nscan_page_size = 3\n",
    )
    .unwrap();

    let config = EngineConfig::from_file(&path).unwrap();
    assert_eq!(config.storage.mode, StorageMode::Memory);
    assert_eq!(config.query.scan_page_size, 3);
    assert_eq!(config.query.history_page_size, 100);

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.config().query.scan_page_size, 3);
}

#[test]
fn zero_page_size_is_rejected() {
    let err = EngineConfig::from_toml_str("[query]\nhistory_page_size = 0\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
