use std::path::PathBuf;

use feed_core::{AppConfig, ConfigError, FeedConfig, FilterMode, DEFAULT_FEED_URL};

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "feedview_{label}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn defaults_point_at_the_feed_and_recent_mode() {
    let config = AppConfig::default();
    assert_eq!(config.feed.endpoint, DEFAULT_FEED_URL);
    assert_eq!(config.feed.endpoint_url().unwrap().as_str(), DEFAULT_FEED_URL);
    assert_eq!(config.feed.max_redirects, 5);
    assert_eq!(config.render.max_body_chars, 200);
    assert!(config.render.link_base_url().is_some());
    assert_eq!(config.ui.initial_filter(), FilterMode::Recent);
}

#[test]
fn partial_file_keeps_defaults_for_missing_fields() {
    let dir = temp_dir("partial");
    let path = dir.join("config.json");
    std::fs::write(
        &path,
        r#"{ "render": { "max_body_chars": 120 }, "ui": { "default_filter": "top" } }"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).expect("valid config");
    assert_eq!(config.render.max_body_chars, 120);
    assert_eq!(config.render.link_base, "https://www.reddit.com");
    assert_eq!(config.ui.initial_filter(), FilterMode::Top);
    assert_eq!(config.feed.endpoint, DEFAULT_FEED_URL);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unknown_default_filter_falls_back_to_recent() {
    let dir = temp_dir("filter");
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{ "ui": { "default_filter": "controversial" } }"#).unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.ui.initial_filter(), FilterMode::Recent);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_files_are_reported() {
    let dir = temp_dir("invalid");
    let path = dir.join("config.json");
    std::fs::write(&path, b"{ this is not json ").unwrap();
    assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse { .. })));

    let missing = dir.join("missing.json");
    assert!(matches!(AppConfig::load_from(&missing), Err(ConfigError::Io { .. })));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_endpoint_is_an_error() {
    let feed = FeedConfig {
        endpoint: "not a url".into(),
        ..FeedConfig::default()
    };
    assert!(matches!(feed.endpoint_url(), Err(ConfigError::InvalidEndpoint { .. })));
}
