//! # Data models
//!
//! Plain data types shared by the analysis pipeline:
//!
//! - [`CatalogEntry`]: one book held on the school's shelves.
//! - [`UserProfile`] / [`UserRecord`]: a registered student and their declared interests.
//! - [`ExternalReference`]: a reading resource found through a live metadata search.
//! - [`RecommendationItem`]: one ranked entry in a recommendation list, wrapping either of the
//!   above behind [`RecommendationSource`].
//! - [`ScanResult`], [`Mood`], [`MoodCategory`]: the output of the text scanner.
//!
//! ## Legacy catalog files
//!
//! Catalog records are accepted in two shapes. The canonical one:
//!
//! ```json
//! {"title": "Laskar Pelangi", "author": "Andrea Hirata", "tags": ["motivasi", "sekolah"],
//!  "category": "Fiksi", "shelf": "A-01", "competency": "Mandiri"}
//! ```
//!
//! and the flat shape written by the first version of the library app, where tags are a single
//! comma-separated string:
//!
//! ```json
//! {"judul": "Laskar Pelangi", "penulis": "Andrea Hirata", "tags": "motivasi, sekolah",
//!  "kategori": "Fiksi", "rak": "A-01", "p5": "Mandiri"}
//! ```
//!
//! Records are always written back in the canonical shape.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Category label reported for every [`ExternalReference`].
pub const EXTERNAL_CATEGORY: &str = "external";

/// A single book in the school catalog.
///
/// Tags are normalized on construction and on deserialization: trimmed, lowercased, and empty
/// strings dropped. An entry without tags is valid; it simply never gains relevance from text
/// overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Book title as printed on the cover.
    #[serde(alias = "judul")]
    pub title: String,

    #[serde(alias = "penulis", default, deserialize_with = "deserialize_text")]
    pub author: String,

    /// Lowercase keywords describing the book.
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: BTreeSet<String>,

    #[serde(alias = "kategori", default, deserialize_with = "deserialize_text")]
    pub category: String,

    /// Shelf code, e.g. `A-01`.
    #[serde(alias = "rak", default, deserialize_with = "deserialize_text")]
    pub shelf: String,

    /// Optional competency-dimension label (e.g. "Bernalar Kritis").
    #[serde(alias = "p5", default, skip_serializing_if = "Option::is_none")]
    pub competency: Option<String>,
}

impl CatalogEntry {
    /// Build an entry, normalizing the supplied tags.
    pub fn new<I, S>(title: &str, author: &str, tags: I, category: &str, shelf: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            tags: normalize_tags(tags),
            category: category.to_string(),
            shelf: shelf.to_string(),
            competency: None,
        }
    }

    pub fn with_competency(mut self, competency: &str) -> Self {
        self.competency = Some(competency.to_string());
        self
    }
}

/// Trim, lowercase and de-duplicate a list of tags, dropping empties.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a comma-separated tag string (the form used by the admin form and legacy files).
pub fn parse_tag_list(raw: &str) -> BTreeSet<String> {
    normalize_tags(raw.split(','))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    Joined(String),
    List(Vec<String>),
    Missing(Option<()>),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawTags::deserialize(deserializer)? {
        RawTags::Joined(raw) => parse_tag_list(&raw),
        RawTags::List(list) => normalize_tags(list),
        RawTags::Missing(_) => BTreeSet::new(),
    })
}

/// Legacy files sometimes carry `null` where a label belongs.
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A registered student as seen by the recommendation pipeline.
///
/// An empty `interests` set behaves exactly like a guest (no profile): personalization stays off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    #[serde(default)]
    pub interests: BTreeSet<String>,
}

impl UserProfile {
    pub fn new<I, S>(display_name: &str, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            display_name: display_name.to_string(),
            interests: normalize_tags(interests),
        }
    }

    /// True when the profile carries at least one interest tag.
    pub fn is_personalized(&self) -> bool {
        !self.interests.is_empty()
    }
}

/// Persisted form of a user, including the hashed credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub interests: BTreeSet<String>,
}

impl UserRecord {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            display_name: self.display_name.clone(),
            interests: self.interests.clone(),
        }
    }
}

/// A reading resource discovered through the external metadata search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub title: String,
    /// First author's "given family" name.
    pub author: String,
    /// Journal, book series or database the item was published in.
    pub publication: String,
    pub link: Option<String>,
}

impl ExternalReference {
    pub fn category(&self) -> &'static str {
        EXTERNAL_CATEGORY
    }
}

/// Where a recommendation came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "entry", rename_all = "snake_case")]
pub enum RecommendationSource {
    Local(CatalogEntry),
    External(ExternalReference),
}

/// One entry in the final recommendation list.
///
/// `relevance` is `Some(n)` with `n >= 1` for catalog matches: the count of text tokens found in
/// the entry's tags plus any personalization or empathy boost. External references carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationItem {
    #[serde(flatten)]
    pub source: RecommendationSource,
    pub relevance: Option<u32>,
    pub personalized: bool,
}

impl RecommendationItem {
    pub fn local(entry: CatalogEntry, relevance: u32, personalized: bool) -> Self {
        Self {
            source: RecommendationSource::Local(entry),
            relevance: Some(relevance),
            personalized,
        }
    }

    pub fn external(reference: ExternalReference) -> Self {
        Self {
            source: RecommendationSource::External(reference),
            relevance: None,
            personalized: false,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.source, RecommendationSource::External(_))
    }

    pub fn title(&self) -> &str {
        match &self.source {
            RecommendationSource::Local(entry) => &entry.title,
            RecommendationSource::External(reference) => &reference.title,
        }
    }
}

/// Keyword families recognised by the mood detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodCategory {
    Anxious,
    Positive,
    Academic,
}

/// Coarse mood label, picked by priority: negative > positive > academic > neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Negative,
    Positive,
    Academic,
    #[default]
    Neutral,
}

impl Mood {
    pub fn from_categories(categories: &BTreeSet<MoodCategory>) -> Self {
        if categories.contains(&MoodCategory::Anxious) {
            Mood::Negative
        } else if categories.contains(&MoodCategory::Positive) {
            Mood::Positive
        } else if categories.contains(&MoodCategory::Academic) {
            Mood::Academic
        } else {
            Mood::Neutral
        }
    }
}

/// Outcome of [`crate::scanner::Scanner::scan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Starts at 100; each triggered rule subtracts its penalty.
    pub safety_score: i32,
    /// One message per triggered rule, in rule-check order.
    pub warnings: Vec<String>,
    /// Anxiety/sadness keywords found in the text, in configured order.
    pub anxiety_keywords: Vec<String>,
    pub mood_categories: BTreeSet<MoodCategory>,
    pub mood: Mood,
}

impl ScanResult {
    /// The result for text with nothing to report.
    pub fn clean() -> Self {
        Self {
            safety_score: 100,
            warnings: Vec::new(),
            anxiety_keywords: Vec::new(),
            mood_categories: BTreeSet::new(),
            mood: Mood::Neutral,
        }
    }
}
