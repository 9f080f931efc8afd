use chrono::{DateTime, NaiveDate, Utc};
use fnv::FnvHashMap;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_AUTHOR: &str = "TechFlow";
pub const ANONYMOUS: &str = "Anonymous";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/800x400";
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Comment sequences keyed by the owning news id, oldest comment first.
pub type CommentMap = FnvHashMap<String, Vec<Comment>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ai,
    Gadgets,
    Software,
    Hardware,
    Crypto,
    #[serde(other)]
    Other,
}

impl Category {
    pub const KNOWN: [Category; 5] = [
        Category::Ai,
        Category::Gadgets,
        Category::Software,
        Category::Hardware,
        Category::Crypto,
    ];

    /// Unrecognized slugs map to `Other` rather than failing.
    pub fn from_slug(slug: &str) -> Self {
        match slug.trim().to_lowercase().as_str() {
            "ai" => Category::Ai,
            "gadgets" => Category::Gadgets,
            "software" => Category::Software,
            "hardware" => Category::Hardware,
            "crypto" => Category::Crypto,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ai => "ai",
            Category::Gadgets => "gadgets",
            Category::Software => "software",
            Category::Hardware => "hardware",
            Category::Crypto => "crypto",
            Category::Other => "other",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Ai => "🤖",
            Category::Gadgets => "📱",
            Category::Software => "💻",
            Category::Hardware => "🔧",
            Category::Crypto => "💰",
            Category::Other => "📰",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "placeholder_image", deserialize_with = "image_or_placeholder")]
    pub image: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub source: Option<String>,
    #[serde(default = "default_author", deserialize_with = "author_or_default")]
    pub author: String,
    #[serde(default = "today", with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default = "anonymous", deserialize_with = "commenter_or_anonymous")]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

/// Partial edit of a news item. Only `Some` fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub full_text: Option<String>,
    pub category: Option<Category>,
    pub image: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub featured: Option<bool>,
}

impl NewsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &NewsUpdate::default()
    }

    pub fn apply_to(self, item: &mut NewsItem) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(excerpt) = self.excerpt {
            item.excerpt = excerpt;
        }
        if let Some(full_text) = self.full_text {
            item.full_text = full_text;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(image) = self.image {
            item.image = if image.trim().is_empty() {
                PLACEHOLDER_IMAGE.to_string()
            } else {
                image
            };
        }
        if let Some(source) = self.source {
            item.source = Some(source).filter(|s| !s.trim().is_empty());
        }
        if let Some(author) = self.author {
            item.author = if author.trim().is_empty() {
                DEFAULT_AUTHOR.to_string()
            } else {
                author
            };
        }
        if let Some(featured) = self.featured {
            item.featured = featured;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    pub news: Vec<NewsItem>,
    #[serde(default)]
    pub comments: CommentMap,
}

/// Versioned, timestamped copy of both collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub data: SnapshotData,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_news: usize,
    pub total_comments: usize,
    pub total_views: u64,
    pub average_views: u64,
}

fn placeholder_image() -> String {
    PLACEHOLDER_IMAGE.to_string()
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn anonymous() -> String {
    ANONYMOUS.to_string()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Integer(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn author_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_as_none(deserializer)?.unwrap_or_else(default_author))
}

fn commenter_or_anonymous<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_as_none(deserializer)?.unwrap_or_else(anonymous))
}

fn image_or_placeholder<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_as_none(deserializer)?.unwrap_or_else(placeholder_image))
}

/// `YYYY-MM-DD` on the way out; on the way in a full ISO timestamp is cut
/// down to its date part.
mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let day = raw.trim();
        let day = day.get(..10).unwrap_or(day);
        NaiveDate::parse_from_str(day, FORMAT).map_err(de::Error::custom)
    }
}
