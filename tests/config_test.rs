use seo_booster::config::{Config, ScoreWeights};
use tempfile::TempDir;

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.fetch.max_link_checks = 7;
    config.fetch.scan_budget_secs = Some(30);
    config.text.target_word_count = 1200;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_rejects_bad_weights() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[weights]\ncontent = 0.9\nkeyword = 0.2\ntechnical = 0.2\nonpage = 0.18\nlinks = 0.17\n",
    )
    .unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn test_load_rejects_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[fetch\nmax_link_checks = ").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert_eq!(err.kind(), "config");
    assert!(err.hint().is_some());
}

#[test]
fn test_custom_weights_accepted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[weights]\ncontent = 0.4\nkeyword = 0.1\ntechnical = 0.2\nonpage = 0.15\nlinks = 0.15\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.weights.content, 0.4);
    assert_ne!(config.weights, ScoreWeights::default());
}

#[test]
fn test_load_rejects_link_checks_above_cap() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[fetch]\nmax_link_checks = 26\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert_eq!(err.kind(), "config");
    assert!(err.to_string().contains("max_link_checks"));
}
