//! The authoring side of the portal.
//!
//! The password gate is a convenience lock for a single shared secret held
//! client side. It is not access control: anyone holding the data can edit
//! it. Real protection needs a server boundary, which this crate does not have.

use chrono::{NaiveDate, Utc};
use csv::{QuoteStyle, WriterBuilder};
use fnv::FnvHashMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{ContentError, Result};
use crate::store::ContentStore;
use crate::structures::{Category, NewsItem, NewsUpdate, DEFAULT_AUTHOR, PLACEHOLDER_IMAGE};

pub struct PasswordGate {
    digest: [u8; 32],
}

impl PasswordGate {
    /// `hex_digest` is the lowercase or uppercase hex SHA-256 of the password.
    pub fn from_hex(hex_digest: &str) -> Result<Self> {
        let bytes = hex::decode(hex_digest.trim())
            .map_err(|e| ContentError::Validation(format!("bad password digest: {}", e)))?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ContentError::Validation("password digest must be 32 bytes".into()))?;
        Ok(PasswordGate { digest })
    }

    pub fn digest_of(password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }

    /// Compares every byte of the digest regardless of where they differ.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = Sha256::digest(password.as_bytes());
        candidate.as_slice().ct_eq(&self.digest).into()
    }
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGate").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    LoggedOut,
    /// `editing` is the id in the edit dialog, if it is open.
    LoggedIn { editing: Option<String> },
}

/// Fields of the publish form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsDraft {
    pub title: String,
    pub excerpt: String,
    pub full_text: String,
    pub category: Category,
    pub image: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub featured: bool,
}

impl NewsDraft {
    fn into_item(self, date: NaiveDate) -> Result<NewsItem> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("excerpt", &self.excerpt),
            ("full text", &self.full_text),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            return Err(ContentError::Validation(format!(
                "missing {}",
                missing.join(", ")
            )));
        }
        let filled = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Ok(NewsItem {
            id: Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            excerpt: self.excerpt.trim().to_string(),
            full_text: self.full_text,
            category: self.category,
            image: filled(self.image).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            source: filled(self.source),
            author: filled(self.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            date,
            featured: self.featured,
            views: 0,
        })
    }
}

/// Prefill for the publish form, from the templates document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsTemplate {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub category: Category,
}

pub type TemplateBook = FnvHashMap<String, NewsTemplate>;

impl From<&NewsTemplate> for NewsDraft {
    fn from(template: &NewsTemplate) -> Self {
        NewsDraft {
            title: template.title.clone(),
            excerpt: template.excerpt.clone(),
            full_text: template.full_text.clone(),
            category: template.category,
            ..NewsDraft::default()
        }
    }
}

/// What the edit dialog is seeded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub full_text: String,
}

#[derive(Debug)]
pub struct AdminConsole {
    gate: PasswordGate,
    session: Session,
}

impl AdminConsole {
    pub fn new(gate: PasswordGate) -> Self {
        AdminConsole {
            gate,
            session: Session::LoggedOut,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.session, Session::LoggedIn { .. })
    }

    pub fn login(&mut self, password: &str) -> bool {
        if self.is_logged_in() {
            return true;
        }
        if self.gate.verify(password) {
            log::info!("Admin console unlocked");
            self.session = Session::LoggedIn { editing: None };
            true
        } else {
            log::warn!("Admin login refused");
            false
        }
    }

    pub fn logout(&mut self) {
        self.session = Session::LoggedOut;
    }

    fn require_login(&self) -> Result<()> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(ContentError::Unauthorized)
        }
    }

    /// Creates and prepends a new item. A featured item takes the spot from
    /// whichever item held it before.
    pub fn publish(&self, store: &mut ContentStore, draft: NewsDraft) -> Result<NewsItem> {
        self.require_login()?;
        let item = draft.into_item(Utc::now().date_naive())?;
        store.add_news(item.clone())?;
        if item.featured {
            store.set_featured(&item.id);
        }
        log::info!("Published {} ({})", item.id, item.title);
        Ok(item)
    }

    pub fn open_editor(&mut self, store: &ContentStore, id: &str) -> Result<EditForm> {
        self.require_login()?;
        let item = store
            .get_news(id)
            .ok_or_else(|| ContentError::NotFound(id.to_string()))?;
        self.session = Session::LoggedIn {
            editing: Some(id.to_string()),
        };
        Ok(EditForm {
            id: item.id.clone(),
            title: item.title.clone(),
            excerpt: item.excerpt.clone(),
            full_text: item.full_text.clone(),
        })
    }

    pub fn editing(&self) -> Option<&str> {
        match &self.session {
            Session::LoggedIn { editing } => editing.as_deref(),
            Session::LoggedOut => None,
        }
    }

    pub fn cancel_edit(&mut self) {
        if let Session::LoggedIn { editing } = &mut self.session {
            *editing = None;
        }
    }

    /// Applies `update` to the item in the open dialog and closes it.
    pub fn save_edit(&mut self, store: &mut ContentStore, update: NewsUpdate) -> Result<()> {
        self.require_login()?;
        let id = self
            .editing()
            .map(str::to_string)
            .ok_or_else(|| ContentError::Validation("no item is open for editing".into()))?;
        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(ContentError::Validation("title cannot be blank".into()));
            }
        }
        let featured = update.featured == Some(true);
        if !store.update_news(&id, update) {
            self.cancel_edit();
            return Err(ContentError::NotFound(id));
        }
        if featured {
            store.set_featured(&id);
        }
        self.cancel_edit();
        Ok(())
    }

    pub fn delete(&self, store: &mut ContentStore, id: &str) -> Result<bool> {
        self.require_login()?;
        Ok(store.delete_news(id))
    }

    pub fn clear_comments(&self, store: &mut ContentStore) -> Result<()> {
        self.require_login()?;
        store.clear_all_comments();
        Ok(())
    }

    /// The management list: title or excerpt match, blank shows everything.
    pub fn manage_list<'a>(&self, store: &'a ContentStore, query: &str) -> Result<Vec<&'a NewsItem>> {
        self.require_login()?;
        let q = query.trim().to_lowercase();
        Ok(store
            .list_news()
            .iter()
            .filter(|n| {
                q.is_empty()
                    || n.title.to_lowercase().contains(&q)
                    || n.excerpt.to_lowercase().contains(&q)
            })
            .collect())
    }

    pub fn export_csv(&self, store: &ContentStore) -> Result<String> {
        self.require_login()?;
        news_csv(store)
    }

    pub fn apply_template(&self, templates: &TemplateBook, name: &str) -> Result<NewsDraft> {
        self.require_login()?;
        templates
            .get(name)
            .map(NewsDraft::from)
            .ok_or_else(|| ContentError::Validation(format!("no template named {}", name)))
    }
}

fn export_failed(e: impl std::fmt::Display) -> ContentError {
    ContentError::Persistence(format!("csv export failed: {}", e))
}

/// One quoted row per item, in collection order, with its live comment count.
pub fn news_csv(store: &ContentStore) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer
        .write_record(["ID", "Title", "Date", "Category", "Comments"])
        .map_err(export_failed)?;
    for item in store.list_news() {
        let date = item.date.format("%Y-%m-%d").to_string();
        let comments = store.comment_count(&item.id).to_string();
        writer
            .write_record([
                item.id.as_str(),
                item.title.as_str(),
                date.as_str(),
                item.category.as_str(),
                comments.as_str(),
            ])
            .map_err(export_failed)?;
    }
    let bytes = writer.into_inner().map_err(export_failed)?;
    String::from_utf8(bytes).map_err(export_failed)
}
