use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use client_core::{MissingRecordPolicy, PageConfig, PageVariant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub server_url: String,
    pub page: PageVariant,
    pub missing_record_policy: MissingRecordPolicy,
    pub request_timeout_seconds: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5001".into(),
            page: PageVariant::Home,
            missing_record_policy: MissingRecordPolicy::FetchFromServer,
            request_timeout_seconds: 10,
        }
    }
}

impl CatalogSettings {
    pub fn page_config(&self) -> PageConfig {
        PageConfig::new(self.page).with_missing_record_policy(self.missing_record_policy)
    }

    /// `None` disables the client timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_seconds > 0).then(|| Duration::from_secs(self.request_timeout_seconds))
    }
}

/// Reads `path` (default `catalog.toml`, optional) and the environment.
pub fn load_settings(path: Option<&Path>) -> Result<CatalogSettings> {
    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string("catalog.toml").ok(),
    };
    settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the flat TOML table, then environment variables.
pub(crate) fn settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<CatalogSettings> {
    let mut settings = CatalogSettings::default();

    if let Some(raw) = file {
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)
            .context("catalog config is not a flat TOML table")?;
        if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
            settings.server_url = v.to_string();
        }
        if let Some(v) = file_cfg.get("page").and_then(toml::Value::as_str) {
            settings.page = v.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(v) = file_cfg
            .get("missing_record_policy")
            .and_then(toml::Value::as_str)
        {
            settings.missing_record_policy = v.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(v) = file_cfg
            .get("request_timeout_seconds")
            .and_then(toml::Value::as_integer)
        {
            settings.request_timeout_seconds = u64::try_from(v)
                .with_context(|| format!("request_timeout_seconds must not be negative: {v}"))?;
        }
    }

    if let Some(v) = env("CATALOG_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__PAGE") {
        settings.page = v.parse().map_err(|e: String| anyhow!(e))?;
    }
    if let Some(v) = env("APP__MISSING_RECORD_POLICY") {
        settings.missing_record_policy = v.parse().map_err(|e: String| anyhow!(e))?;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECONDS") {
        settings.request_timeout_seconds = v
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECONDS is not a number: '{v}'"))?;
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
