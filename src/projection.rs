//! Pure derivation of the visible page of news from the store plus the
//! reader's current choices. Nothing here mutates the store.

use crate::store::ContentStore;
use crate::structures::{Category, NewsItem};

pub const DEFAULT_PAGE_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn from_slug(slug: &str) -> Self {
        match slug.trim() {
            "" | "all" => CategoryFilter::All,
            other => CategoryFilter::Only(Category::from_slug(other)),
        }
    }

    pub fn admits(&self, item: &NewsItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => item.category == *category,
        }
    }
}

impl Default for CategoryFilter {
    fn default() -> Self {
        CategoryFilter::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first.
    Date,
    /// Most viewed first.
    Popular,
    /// Most commented first.
    Comments,
}

impl SortKey {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.trim() {
            "date" => Some(SortKey::Date),
            "popular" => Some(SortKey::Popular),
            "comments" => Some(SortKey::Comments),
            _ => None,
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Date
    }
}

/// What the reader has asked to see. Any change of filter, sort or query
/// sends the reader back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    filter: CategoryFilter,
    sort: SortKey,
    query: String,
    page: usize,
    page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        ViewState {
            filter: CategoryFilter::All,
            sort: SortKey::Date,
            query: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 1;
    }

    /// 1-based. Pages past the end are allowed and simply come back empty.
    pub fn go_to(&mut self, page: usize) {
        self.page = page;
    }
}

/// One rendered page worth of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<'a> {
    pub items: Vec<&'a NewsItem>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// False until the store has finished loading; the listing is then empty.
    pub ready: bool,
}

/// A non-blank query searches title and excerpt of the whole collection and
/// ignores the category filter; a blank one falls back to the filter.
pub fn select<'a>(store: &'a ContentStore, view: &ViewState) -> Vec<&'a NewsItem> {
    let query = view.query.trim().to_lowercase();
    if query.is_empty() {
        store
            .list_news()
            .iter()
            .filter(|n| view.filter.admits(n))
            .collect()
    } else {
        store
            .list_news()
            .iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&query) || n.excerpt.to_lowercase().contains(&query)
            })
            .collect()
    }
}

/// Descending on the chosen key; equal keys keep their current order.
pub fn sort_items(store: &ContentStore, items: &mut [&NewsItem], key: SortKey) {
    match key {
        SortKey::Date => items.sort_by(|a, b| b.date.cmp(&a.date)),
        SortKey::Popular => items.sort_by(|a, b| b.views.cmp(&a.views)),
        SortKey::Comments => items.sort_by_key(|n| std::cmp::Reverse(store.comment_count(&n.id))),
    }
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    (total + page_size - 1) / page_size
}

/// Slice for a 1-based `page`; empty when out of range.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn project<'a>(store: &'a ContentStore, view: &ViewState) -> Listing<'a> {
    if !store.is_ready() {
        return Listing {
            items: Vec::new(),
            page: view.page,
            total_pages: 0,
            total_items: 0,
            ready: false,
        };
    }
    let mut items = select(store, view);
    sort_items(store, &mut items, view.sort);
    let total_items = items.len();
    Listing {
        items: paginate(&items, view.page, view.page_size).to_vec(),
        page: view.page,
        total_pages: page_count(total_items, view.page_size),
        total_items,
        ready: true,
    }
}
