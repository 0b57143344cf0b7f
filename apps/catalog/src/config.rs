use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub cache_url: String,
    pub search_debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            cache_url: "sqlite://./data/catalog.db".into(),
            search_debounce_ms: 300,
        }
    }
}

impl Settings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    cache_url: Option<String>,
    search_debounce_ms: Option<u64>,
}

/// Defaults, then the config file (if present), then the process environment.
pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", config_path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", config_path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.cache_url {
        settings.cache_url = v;
    }
    if let Some(v) = file_cfg.search_debounce_ms {
        settings.search_debounce_ms = v;
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CATALOG_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("CATALOG_CACHE_URL") {
        settings.cache_url = v;
    }
    if let Some(v) = lookup("APP__CACHE_URL") {
        settings.cache_url = v;
    }

    if let Some(v) = lookup("APP__SEARCH_DEBOUNCE_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.search_debounce_ms = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring unparseable APP__SEARCH_DEBOUNCE_MS"),
        }
    }
}

/// Turns a bare path or `sqlite:` URL into the form sqlx accepts.
pub fn normalize_cache_url(raw_cache_url: &str) -> String {
    let raw_cache_url = raw_cache_url.trim();

    if raw_cache_url.is_empty() {
        return Settings::default().cache_url;
    }

    if raw_cache_url.starts_with("sqlite::memory:") {
        return raw_cache_url.to_string();
    }

    let path = if let Some(path) = raw_cache_url.strip_prefix("sqlite://") {
        path
    } else if let Some(path) = raw_cache_url.strip_prefix("sqlite:") {
        path
    } else if raw_cache_url.contains("://") {
        return raw_cache_url.to_string();
    } else {
        raw_cache_url
    };

    let path = path.replace('\\', "/");
    if has_windows_drive(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_windows_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
