//! Saving the store. The sled database on local disk is the copy that
//! matters; pushing to a GitHub repository is a best-effort extra that never
//! fails a save.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::error::{ContentError, Result};
use crate::settings::Settings;
use crate::store::ContentStore;
use crate::structures::{CommentMap, NewsItem, SnapshotData};

pub const NEWS_KEY: &str = "techflow_news";
pub const COMMENTS_KEY: &str = "techflow_comments";
pub const NEWS_PATH: &str = "data/news.json";
pub const COMMENTS_PATH: &str = "data/comments.json";
const GITHUB_API: &str = "https://api.github.com/";

fn encode(input: &impl Serialize) -> Result<Vec<u8>> {
    serde_json::to_vec(input).map_err(|e| ContentError::Persistence(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| ContentError::Persistence(e.to_string()))
}

pub struct LocalStore {
    db: sled::Db,
}

impl LocalStore {
    pub fn open(path: &str, compression: bool) -> Result<Self> {
        let db = sled::Config::default()
            .use_compression(compression)
            .path(path)
            .open()?;
        log::info!(
            "Local store {} opened (recovered: {}, keys: {})",
            path,
            db.was_recovered(),
            db.len()
        );
        Ok(LocalStore { db })
    }

    /// Scratch database removed on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(LocalStore { db })
    }

    /// Writes both documents in one batch and waits for the flush.
    pub async fn write(&self, store: &ContentStore) -> Result<()> {
        let mut batch = sled::Batch::default();
        batch.insert(NEWS_KEY, encode(&store.list_news())?);
        batch.insert(COMMENTS_KEY, encode(store.comment_threads())?);
        self.db.apply_batch(batch)?;
        let flushed = self.db.flush_async().await?;
        log::debug!("Flushed {} bytes to the local store", flushed);
        Ok(())
    }

    /// The last saved copy, or `None` if nothing was ever saved.
    pub fn restore(&self) -> Result<Option<SnapshotData>> {
        let news: Vec<NewsItem> = match self.db.get(NEWS_KEY)? {
            Some(bytes) => decode(&bytes)?,
            None => return Ok(None),
        };
        let comments: CommentMap = match self.db.get(COMMENTS_KEY)? {
            Some(bytes) => decode(&bytes)?,
            None => CommentMap::default(),
        };
        Ok(Some(SnapshotData { news, comments }))
    }

    /// Replaces `store` with the saved copy, if there is a readable one. An
    /// unreadable copy is logged and the loaded documents are kept.
    pub fn restore_into(&self, store: &mut ContentStore) -> bool {
        match self.restore() {
            Ok(Some(saved)) => {
                log::info!("Using locally saved copy ({} news items)", saved.news.len());
                store.restore(saved);
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::error!("Ignoring unreadable local copy: {}", e);
                false
            }
        }
    }
}

#[derive(Deserialize)]
struct ContentsEntry {
    sha: String,
}

#[derive(Serialize)]
struct UpdateFile<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Pushes the JSON documents through the GitHub contents API.
pub struct GitHubSync {
    client: reqwest::Client,
    api_base: Url,
    owner: String,
    repo: String,
    token: String,
    branch: Option<String>,
    timeout: Duration,
}

impl GitHubSync {
    /// `None` when no token/owner is configured.
    pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Option<Self> {
        if !settings.sync_enabled() {
            return None;
        }
        let api_base = Url::parse(GITHUB_API).ok()?;
        Some(GitHubSync {
            client,
            api_base,
            owner: settings.github_owner.trim().to_string(),
            repo: settings.github_repo.trim().to_string(),
            token: settings.github_token.trim().to_string(),
            branch: Some(settings.github_branch.trim().to_string()).filter(|b| !b.is_empty()),
            timeout: settings.sync_timeout(),
        })
    }

    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    fn contents_url(&self, path: &str) -> Result<Url> {
        self.api_base
            .join(&format!("repos/{}/{}/contents/{}", self.owner, self.repo, path))
            .map_err(|e| ContentError::Persistence(e.to_string()))
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        self.client
            .request(method, url.as_str())
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "techflow-newsdesk")
    }

    /// The blob sha of the file as it is now, `None` if it does not exist yet.
    async fn current_sha(&self, url: &Url) -> Result<Option<String>> {
        let mut url = url.clone();
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|e| ContentError::Persistence(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let entry: ContentsEntry = response
            .error_for_status()
            .map_err(|e| ContentError::Persistence(e.to_string()))?
            .json()
            .await
            .map_err(|e| ContentError::Persistence(e.to_string()))?;
        Ok(Some(entry.sha))
    }

    pub async fn push_file(&self, path: &str, body: &str, message: &str) -> Result<()> {
        let url = self.contents_url(path)?;
        let work = async {
            let sha = self.current_sha(&url).await?;
            let update = UpdateFile {
                message,
                content: STANDARD.encode(body),
                sha,
                branch: self.branch.as_deref(),
            };
            self.request(Method::PUT, &url)
                .json(&update)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| ContentError::Persistence(e.to_string()))?;
            Ok::<(), ContentError>(())
        };
        match tokio::time::timeout(self.timeout, work).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ContentError::Persistence(format!(
                "{} sync timed out after {:?}",
                path, self.timeout
            ))),
        }
    }

    pub async fn sync(&self, store: &ContentStore, message: &str) -> Result<()> {
        let news = serde_json::to_string_pretty(store.list_news())
            .map_err(|e| ContentError::Persistence(e.to_string()))?;
        let comments = serde_json::to_string_pretty(store.comment_threads())
            .map_err(|e| ContentError::Persistence(e.to_string()))?;
        self.push_file(NEWS_PATH, &news, message).await?;
        self.push_file(COMMENTS_PATH, &comments, message).await?;
        log::info!("Synced content to {}/{}", self.owner, self.repo);
        Ok(())
    }
}

#[derive(Debug)]
pub enum RemoteOutcome {
    Disabled,
    Synced,
    Failed(ContentError),
}

#[derive(Debug)]
pub struct SaveReport {
    pub remote: RemoteOutcome,
}

pub struct Persistence {
    local: LocalStore,
    remote: Option<GitHubSync>,
}

impl Persistence {
    pub fn new(local: LocalStore, remote: Option<GitHubSync>) -> Self {
        Persistence { local, remote }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Saves locally (clearing the dirty flag), then tries the remote. A
    /// remote failure is reported, not returned.
    pub async fn save(&self, store: &mut ContentStore, message: &str) -> Result<SaveReport> {
        self.local.write(store).await?;
        store.mark_clean();
        let remote = match &self.remote {
            None => RemoteOutcome::Disabled,
            Some(sync) => match sync.sync(store, message).await {
                Ok(()) => RemoteOutcome::Synced,
                Err(e) => {
                    log::warn!("Remote sync failed, keeping the local copy: {}", e);
                    RemoteOutcome::Failed(e)
                }
            },
        };
        Ok(SaveReport { remote })
    }
}
