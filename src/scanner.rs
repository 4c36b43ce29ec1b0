//! # Text scanner (privacy shield)
//!
//! Rule-based checks run over student text before it is posted anywhere. Each rule that fires
//! appends one warning and subtracts its penalty from a starting score of 100. Rules run in a
//! fixed order, which is also the order of [`ScanResult::warnings`]:
//!
//! | # | Rule        | Pattern                                              | Default penalty |
//! |---|-------------|------------------------------------------------------|-----------------|
//! | 1 | email       | `name@host`                                          | 20              |
//! | 2 | phone       | `+62` or `08` followed by 8+ digits                  | 30              |
//! | 3 | national ID | a standalone run of exactly 16 digits                | 50              |
//! | 4 | address     | `Jl.`/`Jalan`/`Rumah`/`Komplek` + a word             | 20              |
//! | 5 | toxic words | any configured word inside the lowercased text       | 25              |
//!
//! Rules 3 and 4 can be switched off in [`ScannerConfig`].
//!
//! Mood detection runs independently and never affects the score: the lowercased tokens are
//! looked up in the anxiety, positive and academic keyword lists.
//!
//! The scanner is pure; the same text always yields the same [`ScanResult`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::config::ScannerConfig;
use crate::matcher::tokenize;
use crate::models::{Mood, MoodCategory, ScanResult};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\+62|08)\d{8,}").unwrap());
static NATIONAL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{16}\b").unwrap());
static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(jl\.|jalan|rumah|komplek)\s\w+").unwrap());

pub const EMAIL_WARNING: &str = "email detected.";
pub const PHONE_WARNING: &str = "phone number detected.";
pub const NATIONAL_ID_WARNING: &str = "ID/financial-number-like pattern detected.";
pub const ADDRESS_WARNING: &str = "address detected.";

/// Privacy/toxicity/mood scanner configured from [`ScannerConfig`].
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Run every enabled rule over `text` and detect its mood.
    ///
    /// Empty text scores 100 with no warnings and a neutral mood.
    pub fn scan(&self, text: &str) -> ScanResult {
        if text.trim().is_empty() {
            return ScanResult::clean();
        }

        let penalties = &self.config.penalties;
        let mut score: i32 = 100;
        let mut warnings = Vec::new();

        if EMAIL_RE.is_match(text) {
            warnings.push(EMAIL_WARNING.to_string());
            score -= penalties.email;
        }
        if PHONE_RE.is_match(text) {
            warnings.push(PHONE_WARNING.to_string());
            score -= penalties.phone;
        }
        if self.config.check_national_id && NATIONAL_ID_RE.is_match(text) {
            warnings.push(NATIONAL_ID_WARNING.to_string());
            score -= penalties.national_id;
        }
        if self.config.check_address && ADDRESS_RE.is_match(text) {
            warnings.push(ADDRESS_WARNING.to_string());
            score -= penalties.address;
        }

        let toxic = self.toxic_words_in(text);
        if !toxic.is_empty() {
            warnings.push(format!("toxic language detected: {}.", toxic.join(", ")));
            score -= penalties.toxic;
        }

        if self.config.clamp_score {
            score = score.max(0);
        }

        let tokens = tokenize(text);
        let anxiety_keywords = matched_in(&self.config.anxiety_words, &tokens);
        let mood_categories = self.mood_categories(&tokens, !anxiety_keywords.is_empty());
        let mood = Mood::from_categories(&mood_categories);

        tracing::debug!(score, warnings = warnings.len(), ?mood, "Scanned text");

        ScanResult {
            safety_score: score,
            warnings,
            anxiety_keywords,
            mood_categories,
            mood,
        }
    }

    /// Configured toxic words appearing anywhere in the lowercased text, in configured order.
    fn toxic_words_in(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.config
            .toxic_words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty() && lowered.contains(w.as_str()))
            .collect()
    }

    fn mood_categories(&self, tokens: &BTreeSet<String>, anxious: bool) -> BTreeSet<MoodCategory> {
        let mut categories = BTreeSet::new();
        if anxious {
            categories.insert(MoodCategory::Anxious);
        }
        if !matched_in(&self.config.positive_words, tokens).is_empty() {
            categories.insert(MoodCategory::Positive);
        }
        if !matched_in(&self.config.academic_words, tokens).is_empty() {
            categories.insert(MoodCategory::Academic);
        }
        categories
    }
}

fn matched_in(words: &[String], tokens: &BTreeSet<String>) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| tokens.contains(w))
        .collect()
}
