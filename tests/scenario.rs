use std::io::Write;
use std::path::Path;

use techflow::portal::{CommentDraft, Portal};
use techflow::source::Sources;
use techflow::structures::{NewsItem, Stats};
use techflow::{ContentError, ContentStore};

fn write_doc(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path.to_str().unwrap().to_string()
}

fn item(id: &str, title: &str) -> NewsItem {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": title,
        "excerpt": "",
        "fullText": "",
        "category": "software",
        "date": "2024-05-01",
        "views": 0
    }))
    .unwrap()
}

#[tokio::test]
async fn empty_documents_to_delete_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let sources = Sources::new(
        &write_doc(dir.path(), "news.json", "[]"),
        &write_doc(dir.path(), "comments.json", "{}"),
    );
    let mut store = ContentStore::new();
    let summary = store.load(&sources, &reqwest::Client::new()).await;
    assert!(summary.failures.is_empty());
    assert!(store.is_ready());
    assert!(store.list_news().is_empty());
    assert_eq!(store.stats(), Stats::default());

    store.add_news(item("a", "A")).unwrap();
    assert_eq!(store.list_news().len(), 1);

    let mut portal = Portal::new(store, 6);
    assert_eq!(portal.open("a").unwrap().item.views, 1);

    portal
        .post_comment("a", CommentDraft::new("Bob", "Great read"))
        .unwrap();
    assert_eq!(portal.store().get_comments("a").len(), 1);
    assert_eq!(portal.store().stats().total_comments, 1);

    assert!(portal.store_mut().delete_news("a"));
    assert!(portal.store().list_news().is_empty());
    // comments go with their item
    assert!(portal.store().get_comments("a").is_empty());
    assert_eq!(portal.store().stats().total_comments, 0);
}

#[tokio::test]
async fn failing_sources_fall_back_to_empty_collections() {
    let dir = tempfile::tempdir().unwrap();
    let news = write_doc(
        dir.path(),
        "news.json",
        r#"[{"id": 1, "title": "Loaded", "date": "2024-02-02"}]"#,
    );
    let missing = dir.path().join("nope.json");
    let sources = Sources::new(&news, missing.to_str().unwrap());

    let mut store = ContentStore::new();
    let summary = store.load(&sources, &reqwest::Client::new()).await;
    assert_eq!(summary.news, 1);
    assert_eq!(summary.comments, 0);
    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(summary.failures[0], ContentError::Load { .. }));
    assert_eq!(store.get_news("1").unwrap().title, "Loaded");
    assert!(store.is_ready());
    assert!(!store.is_dirty());
}

#[tokio::test]
async fn malformed_news_document_still_loads_comments() {
    let dir = tempfile::tempdir().unwrap();
    let sources = Sources::new(
        &write_doc(dir.path(), "news.json", "{ oops"),
        &write_doc(
            dir.path(),
            "comments.json",
            r#"{"x": [{"id": "1", "author": "Ann", "text": "hi", "date": "2024-02-02T10:00:00.000Z"}]}"#,
        ),
    );
    let mut store = ContentStore::new();
    let summary = store.load(&sources, &reqwest::Client::new()).await;
    assert_eq!(summary.failures.len(), 1);
    assert!(store.list_news().is_empty());
    assert_eq!(store.get_comments("x")[0].author, "Ann");
}

#[test]
fn listing_before_load_is_explicitly_not_ready() {
    let portal = Portal::new(ContentStore::new(), 6);
    let listing = portal.listing();
    assert!(!listing.ready);
    assert!(listing.items.is_empty());
}

#[tokio::test]
async fn repeated_ids_are_dropped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let sources = Sources::new(
        &write_doc(
            dir.path(),
            "news.json",
            r#"[{"id": "a", "title": "One"}, {"id": "a", "title": "Two"}, {"id": "b", "title": "Three"}]"#,
        ),
        &write_doc(
            dir.path(),
            "comments.json",
            r#"{"a": [
                {"id": "1", "author": "Ann", "text": "first", "date": "2024-02-02T10:00:00Z"},
                {"id": "1", "author": "Bob", "text": "again", "date": "2024-02-02T11:00:00Z"}
            ]}"#,
        ),
    );
    let mut store = ContentStore::new();
    let summary = store.load(&sources, &reqwest::Client::new()).await;

    assert_eq!(summary.news, 2);
    assert_eq!(summary.comments, 1);
    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(summary.failures[0], ContentError::Load { .. }));
    assert_eq!(store.get_news("a").unwrap().title, "One");
    assert_eq!(store.get_comments("a")[0].text, "first");

    assert!(store.delete_news("a"));
    assert!(store.get_news("a").is_none());
    assert!(store.get_comments("a").is_empty());
    assert_eq!(store.list_news().len(), 1);
}
