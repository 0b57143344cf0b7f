use super::{apply_env_overrides, apply_file_overrides, load_settings, normalize_cache_url, Settings};

use std::{collections::HashMap, fs, time::Duration};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_local_api() {
    let settings = Settings::default();
    assert_eq!(settings.api_url, "http://localhost:3000");
    assert_eq!(settings.search_debounce(), Duration::from_millis(300));
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
        api_url = "http://cars.internal:8080"
        search_debounce_ms = 150
        "#,
    )
    .expect("valid toml");

    assert_eq!(settings.api_url, "http://cars.internal:8080");
    assert_eq!(settings.search_debounce_ms, 150);
    assert_eq!(settings.cache_url, Settings::default().cache_url);
}

#[test]
fn malformed_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file_overrides(&mut settings, "search_debounce_ms = \"soon\"").is_err());
}

#[test]
fn app_prefixed_env_wins_over_catalog_prefixed() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("CATALOG_API_URL", "http://a.example"),
            ("APP__API_URL", "http://b.example"),
            ("CATALOG_CACHE_URL", "./cache/opts.db"),
        ]),
    );

    assert_eq!(settings.api_url, "http://b.example");
    assert_eq!(settings.cache_url, "./cache/opts.db");
}

#[test]
fn unparseable_debounce_env_is_ignored() {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, env_from(&[("APP__SEARCH_DEBOUNCE_MS", "fast")]));
    assert_eq!(settings.search_debounce_ms, 300);

    apply_env_overrides(&mut settings, env_from(&[("APP__SEARCH_DEBOUNCE_MS", " 50 ")]));
    assert_eq!(settings.search_debounce_ms, 50);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings(&dir.path().join("absent.toml")).expect("load");
    assert_eq!(settings.search_debounce_ms, 300);
}

#[test]
fn config_file_is_read_from_given_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(&path, "cache_url = \"sqlite::memory:\"\n").expect("write config");

    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.cache_url, "sqlite::memory:");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_cache_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_cache_url("sqlite:./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_and_blank_falls_back_to_default() {
    assert_eq!(normalize_cache_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(normalize_cache_url("   "), Settings::default().cache_url);
}

#[test]
fn windows_paths_use_single_colon_form() {
    assert_eq!(
        normalize_cache_url("C:\\Users\\alice\\catalog.db"),
        "sqlite:C:/Users/alice/catalog.db"
    );
    assert_eq!(
        normalize_cache_url("sqlite://C:/Users/alice/catalog.db"),
        "sqlite:C:/Users/alice/catalog.db"
    );
}

#[tokio::test]
async fn normalized_url_opens_sqlite_file_in_new_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("catalog.db");

    let url = normalize_cache_url(db_path.to_string_lossy().as_ref());
    let store = storage::SqliteStore::new(&url).await.expect("open sqlite");
    drop(store);

    assert!(db_path.exists(), "cache file should exist: {}", db_path.display());
}
