use techflow::portal::{CommentDraft, Portal};
use techflow::projection::{CategoryFilter, SortKey};
use techflow::structures::{Category, CommentMap, NewsItem};
use techflow::ContentStore;

fn news() -> Vec<NewsItem> {
    serde_json::from_value(serde_json::json!([
        {"id": "1", "title": "GPU prices fall", "excerpt": "Hardware news", "category": "hardware", "date": "2024-03-01", "views": 10},
        {"id": "2", "title": "New LLM", "excerpt": "An AI model with a GPU appetite", "category": "ai", "date": "2024-03-03", "views": 50},
        {"id": "3", "title": "Bitcoin halving", "excerpt": "Crypto", "fullText": "mentions gpu mining", "category": "crypto", "date": "2024-03-02", "views": 10},
        {"id": "4", "title": "Phone review", "excerpt": "Gadgets", "category": "gadgets", "date": "2024-03-03", "views": 0},
        {"id": "5", "title": "Editor release", "excerpt": "Software", "category": "software", "date": "2024-02-20", "views": 7},
        {"id": "6", "title": "Robot arms", "excerpt": "AI robots", "category": "ai", "date": "2024-01-10", "views": 3},
        {"id": "7", "title": "Mining rigs", "excerpt": "Crypto hardware", "category": "crypto", "date": "2024-01-05", "views": 1}
    ]))
    .unwrap()
}

fn portal() -> Portal {
    Portal::new(ContentStore::from_parts(news(), CommentMap::default()), 6)
}

fn ids(portal: &Portal) -> Vec<String> {
    portal
        .listing()
        .items
        .iter()
        .map(|n| n.id.clone())
        .collect()
}

#[test]
fn default_view_is_newest_first_with_stable_ties() {
    let portal = portal();
    assert_eq!(ids(&portal), vec!["2", "4", "3", "1", "5", "6"]);
    let listing = portal.listing();
    assert_eq!(listing.total_items, 7);
    assert_eq!(listing.total_pages, 2);
}

#[test]
fn pages_past_the_end_are_empty() {
    let mut portal = portal();
    portal.go_to(2);
    assert_eq!(ids(&portal), vec!["7"]);
    portal.go_to(3);
    assert!(portal.listing().items.is_empty());
    assert!(portal.listing().ready);
}

#[test]
fn category_filter_narrows_the_listing() {
    let mut portal = portal();
    portal.filter_by(CategoryFilter::Only(Category::Crypto));
    assert_eq!(ids(&portal), vec!["3", "7"]);
}

#[test]
fn search_overrides_the_category_filter() {
    let mut portal = portal();
    portal.filter_by(CategoryFilter::Only(Category::Crypto));
    portal.search("gpu");
    // title/excerpt only: the crypto item that mentions gpu in its body is out
    assert_eq!(ids(&portal), vec!["2", "1"]);

    portal.search("  ");
    assert_eq!(ids(&portal), vec!["3", "7"]);
}

#[test]
fn popular_sort_keeps_ties_in_order() {
    let mut portal = portal();
    portal.sort_by(SortKey::Popular);
    assert_eq!(ids(&portal), vec!["2", "1", "3", "5", "6", "7"]);
}

#[test]
fn comment_sort_counts_threads_at_sort_time() {
    let mut portal = portal();
    for _ in 0..2 {
        portal
            .post_comment("6", CommentDraft::new("Ann", "hi"))
            .unwrap();
    }
    portal
        .post_comment("5", CommentDraft::new("Bob", "hey"))
        .unwrap();
    portal.sort_by(SortKey::Comments);
    assert_eq!(&ids(&portal)[..3], &["6", "5", "1"]);
}

#[test]
fn view_changes_send_the_reader_to_page_one() {
    let mut portal = portal();
    portal.go_to(2);
    portal.sort_by(SortKey::Date);
    assert_eq!(portal.view().page(), 1);
    portal.go_to(2);
    portal.search("x");
    assert_eq!(portal.view().page(), 1);
}

#[test]
fn opening_twice_counts_twice() {
    let mut portal = portal();
    let before = portal.store().get_news("4").unwrap().views;
    portal.open("4").unwrap();
    portal.open("4").unwrap();
    assert_eq!(portal.store().get_news("4").unwrap().views, before + 2);
    assert!(portal.store().is_dirty());
}

#[test]
fn configurable_page_size() {
    let portal = Portal::new(ContentStore::from_parts(news(), CommentMap::default()), 3);
    let listing = portal.listing();
    assert_eq!(listing.items.len(), 3);
    assert_eq!(listing.total_pages, 3);
}
