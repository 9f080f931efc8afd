use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::source::Sources;

/// SHA-256 of `admin123`, the stock password of a fresh install.
const STOCK_PASSWORD_HASH: &str =
    "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub news_source: String,
    pub comments_source: String,
    pub templates_source: String,
    pub database_name: String,
    pub db_compression_enabled: bool,
    pub page_size: usize,
    pub admin_password_hash: String,
    pub github_owner: String,
    pub github_repo: String,
    pub github_token: String,
    pub github_branch: String,
    pub sync_timeout_secs: u64,
}

impl Settings {
    /// Defaults, then `Settings.toml` if present, then `TECHFLOW_*` variables.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("Settings")
    }

    pub fn from_file(name: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("news_source", "data/news.json")?
            .set_default("comments_source", "data/comments.json")?
            .set_default("templates_source", "data/template.json")?
            .set_default("database_name", "techflow_db")?
            .set_default("db_compression_enabled", true)?
            .set_default("page_size", 6_i64)?
            .set_default("admin_password_hash", STOCK_PASSWORD_HASH)?
            .set_default("github_owner", "")?
            .set_default("github_repo", "techflow-news")?
            .set_default("github_token", "")?
            .set_default("github_branch", "")?
            .set_default("sync_timeout_secs", 10_i64)?
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("TECHFLOW").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn sources(&self) -> Sources {
        Sources::new(&self.news_source, &self.comments_source)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    /// Remote sync stays off until both a token and an owner are configured.
    pub fn sync_enabled(&self) -> bool {
        !self.github_token.trim().is_empty() && !self.github_owner.trim().is_empty()
    }
}
