//! Config files on disk.

use nexus::NexusConfig;

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = NexusConfig::default();
    config.clipboard.history_capacity = 10;
    config.auto_update.enabled_at_start = false;
    config.assistant.model = "gemini-test".into();
    config.save_to_file(&path).unwrap();

    let loaded = NexusConfig::from_file(&path).unwrap();
    assert_eq!(loaded.clipboard.history_capacity, 10);
    assert!(!loaded.auto_update.enabled_at_start);
    assert_eq!(loaded.assistant.model, "gemini-test");
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[clipboard]\npoll_interval_ms = 10\n").unwrap();

    let loaded = NexusConfig::from_file(&path).unwrap();
    let defaults = NexusConfig::default();
    assert_eq!(loaded.clipboard.poll_interval_ms, 10);
    assert_eq!(loaded.clipboard.poll_interval().as_millis(), 50);
    assert_eq!(
        loaded.clipboard.history_capacity,
        defaults.clipboard.history_capacity
    );
    assert_eq!(
        loaded.auto_update.delayed_update_secs,
        defaults.auto_update.delayed_update_secs
    );
    assert_eq!(loaded.assistant.api_key_env, "GEMINI_API_KEY");
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "clipboard = 3").unwrap();

    let err = NexusConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, nexus::NexusError::Config(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = NexusConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, nexus::NexusError::Io(_)));
}
