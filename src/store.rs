//! In-memory content store: the single owner of the news and comment
//! collections for a session.
//!
//! Lookups that miss are `Option`/`bool` results, never errors. Every
//! mutation flips the dirty flag; only persistence (or a fresh load) clears it.

use chrono::Utc;
use fnv::FnvHashSet;
use serde::Deserialize;

use crate::error::{ContentError, Result};
use crate::source::Sources;
use crate::structures::{
    Category, Comment, CommentMap, NewsItem, NewsUpdate, Snapshot, SnapshotData, Stats,
    SNAPSHOT_VERSION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Ready,
}

/// Outcome of [`ContentStore::load`]. Failed resources are listed but the
/// store is still usable with whatever did load.
#[derive(Debug)]
pub struct LoadSummary {
    pub news: usize,
    pub comments: usize,
    pub failures: Vec<ContentError>,
}

#[derive(Debug, Clone)]
pub struct ContentStore {
    news: Vec<NewsItem>,
    comments: CommentMap,
    dirty: bool,
    state: LoadState,
}

impl Default for ContentStore {
    fn default() -> Self {
        ContentStore {
            news: Vec::new(),
            comments: CommentMap::default(),
            dirty: false,
            state: LoadState::NotLoaded,
        }
    }
}

// `import` only requires the `data` envelope; version and date are advisory.
#[derive(Deserialize)]
struct ImportEnvelope {
    data: SnapshotData,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Drops news items whose id was already seen and comments whose id repeats
/// within their thread. The first occurrence wins. Returns what was dropped.
fn drop_repeated_ids(news: &mut Vec<NewsItem>, comments: &mut CommentMap) -> Vec<String> {
    let mut dropped = Vec::new();
    let mut seen = FnvHashSet::default();
    news.retain(|n| {
        let first = seen.insert(n.id.clone());
        if !first {
            dropped.push(format!("news id {}", n.id));
        }
        first
    });
    for (news_id, thread) in comments.iter_mut() {
        let mut seen = FnvHashSet::default();
        thread.retain(|c| {
            let first = seen.insert(c.id.clone());
            if !first {
                dropped.push(format!("comment id {} on {}", c.id, news_id));
            }
            first
        });
    }
    dropped
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ready store over already-parsed collections.
    pub fn from_parts(news: Vec<NewsItem>, comments: CommentMap) -> Self {
        ContentStore {
            news,
            comments,
            dirty: false,
            state: LoadState::Ready,
        }
    }

    /// Fetches both documents concurrently, then swaps them in together.
    pub async fn load(&mut self, sources: &Sources, client: &reqwest::Client) -> LoadSummary {
        let (news, comments) = futures::join!(
            sources.news.fetch_json::<Vec<NewsItem>>(client),
            sources.comments.fetch_json::<CommentMap>(client),
        );
        let mut failures = Vec::new();
        let mut news = match news {
            Ok(news) => news,
            Err(e) => {
                log::error!("News unavailable, starting with none: {}", e);
                failures.push(e);
                Vec::new()
            }
        };
        let mut comments = match comments {
            Ok(comments) => comments,
            Err(e) => {
                log::error!("Comments unavailable, starting with none: {}", e);
                failures.push(e);
                CommentMap::default()
            }
        };
        let dropped = drop_repeated_ids(&mut news, &mut comments);
        if !dropped.is_empty() {
            let e = ContentError::load(
                format!("{} and {}", sources.news, sources.comments),
                format!("dropped repeated {}", dropped.join(", ")),
            );
            log::warn!("{}", e);
            failures.push(e);
        }
        *self = ContentStore::from_parts(news, comments);
        let summary = LoadSummary {
            news: self.news.len(),
            comments: self.total_comments(),
            failures,
        };
        log::info!(
            "Loaded {} news items and {} comments",
            summary.news,
            summary.comments
        );
        summary
    }

    /// Swaps in a previously persisted copy. It matches what is on disk, so
    /// the store comes back clean. Repeated ids are dropped, first one wins.
    pub fn restore(&mut self, data: SnapshotData) {
        let SnapshotData {
            mut news,
            mut comments,
        } = data;
        let dropped = drop_repeated_ids(&mut news, &mut comments);
        if !dropped.is_empty() {
            log::warn!("Saved copy had repeated ids, dropped {}", dropped.join(", "));
        }
        *self = ContentStore::from_parts(news, comments);
    }

    /// Empties both collections. Nothing is left to save, so the store is clean.
    pub fn clear(&mut self) {
        self.news.clear();
        self.comments.clear();
        self.dirty = false;
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Insertion order, newest additions first.
    pub fn list_news(&self) -> &[NewsItem] {
        &self.news
    }

    pub fn get_news(&self, id: &str) -> Option<&NewsItem> {
        self.news.iter().find(|n| n.id == id)
    }

    fn get_news_mut(&mut self, id: &str) -> Option<&mut NewsItem> {
        self.news.iter_mut().find(|n| n.id == id)
    }

    /// Prepends `item`. The id must already be assigned and unused.
    pub fn add_news(&mut self, item: NewsItem) -> Result<()> {
        if item.id.is_empty() {
            return Err(ContentError::Validation("news item has no id".into()));
        }
        if self.get_news(&item.id).is_some() {
            return Err(ContentError::Validation(format!(
                "news id {} is already taken",
                item.id
            )));
        }
        self.news.insert(0, item);
        self.dirty = true;
        Ok(())
    }

    pub fn update_news(&mut self, id: &str, update: NewsUpdate) -> bool {
        match self.get_news_mut(id) {
            Some(item) => {
                update.apply_to(item);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Removes the item and, with it, its comment thread.
    pub fn delete_news(&mut self, id: &str) -> bool {
        match self.news.iter().position(|n| n.id == id) {
            Some(index) => {
                self.news.remove(index);
                self.comments.remove(id);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Bumps the view counter by one and returns the new count.
    pub fn record_view(&mut self, id: &str) -> Option<u64> {
        let item = self.get_news_mut(id)?;
        item.views = item.views.saturating_add(1);
        let views = item.views;
        self.dirty = true;
        Some(views)
    }

    /// Makes `id` the only featured item.
    pub fn set_featured(&mut self, id: &str) -> bool {
        if self.get_news(id).is_none() {
            return false;
        }
        for item in self.news.iter_mut() {
            item.featured = item.id == id;
        }
        self.dirty = true;
        true
    }

    pub fn get_comments(&self, news_id: &str) -> &[Comment] {
        self.comments
            .get(news_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn comment_threads(&self) -> &CommentMap {
        &self.comments
    }

    pub fn comment_count(&self, news_id: &str) -> usize {
        self.get_comments(news_id).len()
    }

    pub fn total_comments(&self) -> usize {
        self.comments.values().map(Vec::len).sum()
    }

    /// Appends to the thread for `news_id`, creating it if needed.
    pub fn add_comment(&mut self, news_id: &str, comment: Comment) -> Result<()> {
        let thread = self.comments.entry(news_id.to_string()).or_default();
        if thread.iter().any(|c| c.id == comment.id) {
            return Err(ContentError::Validation(format!(
                "comment id {} already exists on {}",
                comment.id, news_id
            )));
        }
        thread.push(comment);
        self.dirty = true;
        Ok(())
    }

    pub fn delete_comment(&mut self, news_id: &str, comment_id: &str) -> bool {
        let thread = match self.comments.get_mut(news_id) {
            Some(thread) => thread,
            None => return false,
        };
        match thread.iter().position(|c| c.id == comment_id) {
            Some(index) => {
                thread.remove(index);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn clear_all_comments(&mut self) {
        self.comments.clear();
        self.dirty = true;
    }

    pub fn stats(&self) -> Stats {
        let total_news = self.news.len();
        let total_views: u64 = self.news.iter().map(|n| n.views).sum();
        let average_views = if total_news == 0 {
            0
        } else {
            (total_views as f64 / total_news as f64).round() as u64
        };
        Stats {
            total_news,
            total_comments: self.total_comments(),
            total_views,
            average_views,
        }
    }

    /// Case-insensitive match on title, excerpt or body. A blank query
    /// returns everything.
    pub fn search(&self, query: &str) -> Vec<&NewsItem> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.news.iter().collect();
        }
        self.news
            .iter()
            .filter(|n| {
                contains_ci(&n.title, &q) || contains_ci(&n.excerpt, &q) || contains_ci(&n.full_text, &q)
            })
            .collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<&NewsItem> {
        self.news.iter().filter(|n| n.category == category).collect()
    }

    /// Most viewed first; ties keep their collection order.
    pub fn popular(&self, limit: usize) -> Vec<&NewsItem> {
        let mut items: Vec<&NewsItem> = self.news.iter().collect();
        items.sort_by(|a, b| b.views.cmp(&a.views));
        items.truncate(limit);
        items
    }

    pub fn featured(&self) -> Vec<&NewsItem> {
        self.news.iter().filter(|n| n.featured).collect()
    }

    pub fn export(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            export_date: Utc::now(),
            data: SnapshotData {
                news: self.news.clone(),
                comments: self.comments.clone(),
            },
        }
    }

    /// Replaces both collections from an exported snapshot. The store is left
    /// untouched when the snapshot does not have the expected shape.
    pub fn try_import(&mut self, snapshot: serde_json::Value) -> Result<()> {
        let ImportEnvelope {
            data: SnapshotData {
                mut news,
                mut comments,
            },
        } = serde_json::from_value::<ImportEnvelope>(snapshot)
            .map_err(|e| ContentError::Validation(format!("not a snapshot: {}", e)))?;
        let repeated = drop_repeated_ids(&mut news, &mut comments);
        if !repeated.is_empty() {
            return Err(ContentError::Validation(format!(
                "snapshot repeats {}",
                repeated.join(", ")
            )));
        }
        self.news = news;
        self.comments = comments;
        self.state = LoadState::Ready;
        self.dirty = true;
        Ok(())
    }

    pub fn import(&mut self, snapshot: serde_json::Value) -> bool {
        match self.try_import(snapshot) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Import refused: {}", e);
                false
            }
        }
    }
}
