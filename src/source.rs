use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ContentError, Result};

/// Where a JSON document lives: fetched over HTTP(S) or read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Remote(Url),
    Local(PathBuf),
}

impl DocumentSource {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => DocumentSource::Remote(url),
            _ => DocumentSource::Local(PathBuf::from(location)),
        }
    }

    pub async fn fetch_text(&self, client: &reqwest::Client) -> Result<String> {
        match self {
            DocumentSource::Remote(url) => {
                let response = client
                    .get(url.as_str())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| ContentError::load(self, e))?;
                response.text().await.map_err(|e| ContentError::load(self, e))
            }
            DocumentSource::Local(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ContentError::load(self, e)),
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, client: &reqwest::Client) -> Result<T> {
        let body = self.fetch_text(client).await?;
        serde_json::from_str(&body).map_err(|e| ContentError::load(self, e))
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Remote(url) => write!(f, "{}", url),
            DocumentSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The two documents the store is populated from at start-up.
#[derive(Debug, Clone)]
pub struct Sources {
    pub news: DocumentSource,
    pub comments: DocumentSource,
}

impl Sources {
    pub fn new(news: &str, comments: &str) -> Self {
        Sources {
            news: DocumentSource::parse(news),
            comments: DocumentSource::parse(comments),
        }
    }
}
