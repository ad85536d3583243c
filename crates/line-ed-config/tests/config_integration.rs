use line_ed_config::EditorConfig;

#[test]
fn test_load_creates_default_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("line-ed").join("config.json");
    assert!(!path.exists());

    let config = EditorConfig::load_or_create(&path);
    assert!(path.exists());
    assert_eq!(config, EditorConfig::default());

    // File should contain valid JSON
    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert!(parsed.is_object());
}

#[test]
fn test_load_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let json = r#"{
        "search": { "use_regex": false, "case_sensitive": false, "whole_word": true },
        "print_count": 5,
        "save_after_script": false,
        "backup_on_save": true
    }"#;
    std::fs::write(&path, json).unwrap();

    let config = EditorConfig::load_or_create(&path);
    assert!(!config.search.use_regex);
    assert!(!config.search.case_sensitive);
    assert!(config.search.whole_word);
    assert_eq!(config.print_count, 5);
    assert!(!config.save_after_script);
    assert!(config.backup_on_save);
}

#[test]
fn test_broken_json_returns_defaults_and_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ this is not valid json }}}").unwrap();

    let config = EditorConfig::load_or_create(&path);
    assert_eq!(config, EditorConfig::default());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{ this is not valid json }}}"
    );
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"print_count": 3}"#).unwrap();

    let config = EditorConfig::load_or_create(&path);
    assert_eq!(config.print_count, 3);
    assert!(config.save_after_script);
    assert!(config.search.use_regex);
}

#[test]
fn test_loaded_values_are_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"print_count": 0}"#).unwrap();

    let config = EditorConfig::load_or_create(&path);
    assert_eq!(config.print_count, 1);
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut config = EditorConfig::default();
    config.print_count = 20;
    config.search.whole_word = true;
    config.save(&path).unwrap();

    assert_eq!(EditorConfig::load_or_create(&path), config);
}

#[test]
fn test_load_reports_broken_and_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = EditorConfig::load(&missing).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    assert!(!missing.exists());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "[1, 2").unwrap();
    assert!(EditorConfig::load(&broken).is_err());
}
