//! # Local matcher
//!
//! Ranks catalog entries against a piece of student text.
//!
//! ## Scoring
//! For every entry:
//!
//! 1. **Overlap**: the number of entry tags that appear as whole tokens of the text
//!    (see [`tokenize`]). Tags are compared exactly, so a multi-word tag such as
//!    `"ilmu alam"` never matches a single text token.
//! 2. **Personalization**: with a profile that has interests, each interest found among the
//!    entry's tags or the words of its category adds `personalization_boost`.
//! 3. **Empathy**: if the text contains one of the empathy trigger words (e.g. *sedih*, *takut*)
//!    and the entry's category is one of the configured self-development categories, the entry
//!    gains the empathy boost regardless of overlap.
//!
//! Entries with a total of 0 are dropped; the rest are sorted by descending relevance, ties kept
//! in catalog order.

use std::collections::BTreeSet;

use crate::config::{EmpathyRule, MatcherConfig};
use crate::models::{CatalogEntry, RecommendationItem, UserProfile};

/// Lowercase `text`, replace every non-word character with a space and split on whitespace.
///
/// ```
/// use sobat_pustaka::matcher::tokenize;
///
/// let tokens = tokenize("Suka Coding, dan sains!");
/// assert!(tokens.contains("coding"));
/// assert!(tokens.contains("sains"));
/// ```
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Catalog ranker configured from [`MatcherConfig`].
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Rank `catalog` against `text`, optionally personalized for `profile`.
    ///
    /// Never fails; returns an empty list when nothing is relevant.
    pub fn rank(
        &self,
        text: &str,
        catalog: &[CatalogEntry],
        profile: Option<&UserProfile>,
    ) -> Vec<RecommendationItem> {
        let tokens = tokenize(text);
        let empathetic = self.empathy_triggered(&tokens);
        let profile = profile.filter(|p| p.is_personalized());

        let mut scored: Vec<(u32, bool, &CatalogEntry)> = catalog
            .iter()
            .filter_map(|entry| {
                let overlap = tag_overlap(&tokens, entry);
                let boost = profile
                    .map(|p| self.personalization_boost(p, entry))
                    .unwrap_or(0);
                let empathy = if empathetic && in_categories(&self.config.empathy, entry) {
                    self.config.empathy.boost
                } else {
                    0
                };

                let relevance = overlap + boost + empathy;
                (relevance > 0).then_some((relevance, boost > 0, entry))
            })
            .collect();

        // `sort_by` is stable, so equal scores keep catalog order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        tracing::debug!(
            matched = scored.len(),
            catalog = catalog.len(),
            empathetic,
            "Ranked catalog"
        );

        scored
            .into_iter()
            .map(|(relevance, personalized, entry)| {
                RecommendationItem::local(entry.clone(), relevance, personalized)
            })
            .collect()
    }

    fn empathy_triggered(&self, tokens: &BTreeSet<String>) -> bool {
        let rule = &self.config.empathy;
        rule.enabled
            && rule
                .trigger_words
                .iter()
                .any(|w| tokens.contains(&w.trim().to_lowercase()))
    }

    fn personalization_boost(&self, profile: &UserProfile, entry: &CatalogEntry) -> u32 {
        let category_words = tokenize(&entry.category);
        let hits = profile
            .interests
            .iter()
            .filter(|interest| entry.tags.contains(*interest) || category_words.contains(*interest))
            .count() as u32;
        hits * self.config.personalization_boost
    }
}

fn tag_overlap(tokens: &BTreeSet<String>, entry: &CatalogEntry) -> u32 {
    entry.tags.iter().filter(|tag| tokens.contains(*tag)).count() as u32
}

fn in_categories(rule: &EmpathyRule, entry: &CatalogEntry) -> bool {
    let category = entry.category.trim().to_lowercase();
    rule.categories
        .iter()
        .any(|c| c.trim().to_lowercase() == category)
}
