use chrono::Utc;
use uuid::Uuid;

use crate::error::{ContentError, Result};
use crate::markdown;
use crate::projection::{self, CategoryFilter, Listing, SortKey, ViewState};
use crate::store::ContentStore;
use crate::structures::{Comment, NewsItem};

/// Everything the detail view shows for one opened item.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub item: NewsItem,
    pub body_html: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub author: String,
    pub text: String,
}

impl CommentDraft {
    pub fn new(author: &str, text: &str) -> Self {
        CommentDraft {
            author: author.to_string(),
            text: text.to_string(),
        }
    }

    fn into_comment(self) -> Result<Comment> {
        let author = self.author.trim();
        let text = self.text.trim();
        if author.is_empty() || text.is_empty() {
            return Err(ContentError::Validation(
                "a comment needs both a name and some text".into(),
            ));
        }
        Ok(Comment {
            id: Uuid::new_v4().to_string(),
            author: author.to_string(),
            text: text.to_string(),
            date: Utc::now(),
        })
    }
}

/// The public reading side: one store, one reader's view state.
#[derive(Debug)]
pub struct Portal {
    store: ContentStore,
    view: ViewState,
}

impl Portal {
    pub fn new(store: ContentStore, page_size: usize) -> Self {
        Portal {
            store,
            view: ViewState::new(page_size),
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContentStore {
        &mut self.store
    }

    pub fn into_store(self) -> ContentStore {
        self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn filter_by(&mut self, filter: CategoryFilter) {
        self.view.set_filter(filter);
    }

    pub fn sort_by(&mut self, sort: SortKey) {
        self.view.set_sort(sort);
    }

    pub fn search(&mut self, query: &str) {
        self.view.set_query(query);
    }

    pub fn go_to(&mut self, page: usize) {
        self.view.go_to(page);
    }

    pub fn listing(&self) -> Listing<'_> {
        projection::project(&self.store, &self.view)
    }

    /// The hero slot shows the first featured item, if any.
    pub fn featured(&self) -> Option<&NewsItem> {
        self.store.featured().into_iter().next()
    }

    /// Opening counts as one view, every time.
    pub fn open(&mut self, id: &str) -> Option<Detail> {
        self.store.record_view(id)?;
        let item = self.store.get_news(id)?.clone();
        log::debug!("Opened {} ({} views)", item.id, item.views);
        Some(Detail {
            body_html: markdown::to_html(&item.full_text),
            comments: self.store.get_comments(id).to_vec(),
            item,
        })
    }

    pub fn post_comment(&mut self, news_id: &str, draft: CommentDraft) -> Result<Comment> {
        if self.store.get_news(news_id).is_none() {
            return Err(ContentError::NotFound(news_id.to_string()));
        }
        let comment = draft.into_comment()?;
        self.store.add_comment(news_id, comment.clone())?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::CommentMap;

    fn sample() -> Portal {
        let news: Vec<NewsItem> = serde_json::from_value(serde_json::json!([
            {"id": "a", "title": "Alpha", "fullText": "**hi**", "date": "2024-01-01", "featured": true},
            {"id": "b", "title": "Beta", "date": "2024-01-02"}
        ]))
        .unwrap();
        Portal::new(ContentStore::from_parts(news, CommentMap::default()), 6)
    }

    #[test]
    fn open_renders_and_counts() {
        let mut portal = sample();
        let detail = portal.open("a").unwrap();
        assert_eq!(detail.item.views, 1);
        assert_eq!(detail.body_html, "<p><strong>hi</strong></p>");
        assert!(portal.open("zzz").is_none());
    }

    #[test]
    fn blank_comments_are_rejected() {
        let mut portal = sample();
        let err = portal
            .post_comment("a", CommentDraft::new("  ", "text"))
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
        assert_eq!(portal.store().comment_count("a"), 0);

        let err = portal
            .post_comment("zzz", CommentDraft::new("Bob", "hi"))
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
    }

    #[test]
    fn comments_are_trimmed_and_stored() {
        let mut portal = sample();
        let comment = portal
            .post_comment("b", CommentDraft::new(" Bob ", " first! "))
            .unwrap();
        assert_eq!(comment.author, "Bob");
        assert_eq!(comment.text, "first!");
        assert_eq!(portal.open("b").unwrap().comments, vec![comment]);
    }

    #[test]
    fn featured_is_first_flagged_item() {
        assert_eq!(sample().featured().map(|n| n.id.as_str()), Some("a"));
    }
}
