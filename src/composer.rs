//! # Recommendation composer
//!
//! Combines local catalog matches with external references under a [`MergePolicy`]:
//!
//! - [`MergePolicy::Always`]: when the caller asks for external results, search every time.
//! - [`MergePolicy::SparseFallback`]: search only when fewer than `threshold` local matches were
//!   found; local matches are optionally cut to `local_limit`.
//!
//! Whatever the policy, the final list is local matches (already ranked) followed by external
//! references. External results are never ranked above local ones. When the caller does not ask
//! for external results no request is made under either policy.

use crate::config::{MatcherConfig, MergePolicy};
use crate::fetcher::{ReferenceSource, build_query};
use crate::matcher::Matcher;
use crate::models::{CatalogEntry, RecommendationItem, UserProfile};

pub struct Composer<S> {
    matcher: Matcher,
    policy: MergePolicy,
    source: S,
}

impl<S: ReferenceSource> Composer<S> {
    pub fn new(matcher_config: MatcherConfig, policy: MergePolicy, source: S) -> Self {
        Self {
            matcher: Matcher::new(matcher_config),
            policy,
            source,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Produce the final ordered recommendation list for `text`.
    pub async fn recommend(
        &self,
        text: &str,
        catalog: &[CatalogEntry],
        profile: Option<&UserProfile>,
        use_external: bool,
    ) -> Vec<RecommendationItem> {
        let mut local = self.matcher.rank(text, catalog, profile);

        let search = match &self.policy {
            MergePolicy::Always => use_external,
            MergePolicy::SparseFallback {
                threshold,
                local_limit,
            } => {
                let sparse = local.len() < *threshold;
                if let Some(limit) = local_limit {
                    local.truncate(*limit);
                }
                use_external && sparse
            }
        };

        if !search {
            return local;
        }

        let external = match build_query(text) {
            Some(query) => self.source.fetch(&query).await,
            None => {
                tracing::debug!("Query too short, skipping external search");
                Vec::new()
            }
        };

        tracing::debug!(
            local = local.len(),
            external = external.len(),
            "Composed recommendations"
        );

        local.extend(external.into_iter().map(RecommendationItem::external));
        local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{CrossrefClient, NoExternal};
    use crate::config::ExternalConfig;
    use crate::models::ExternalReference;
    use crate::store::default_catalog;
    use std::sync::Mutex;

    /// Records every query and answers with two canned references.
    #[derive(Default)]
    struct StubSource {
        queries: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl ReferenceSource for StubSource {
        async fn fetch(&self, query: &str) -> Vec<ExternalReference> {
            self.queries.lock().unwrap().push(query.to_string());
            ["Alpha", "Beta"]
                .iter()
                .map(|t| ExternalReference {
                    title: t.to_string(),
                    author: "unknown author".into(),
                    publication: "Journal".into(),
                    link: None,
                })
                .collect()
        }
    }

    fn composer<S: ReferenceSource>(policy: MergePolicy, source: S) -> Composer<S> {
        Composer::new(MatcherConfig::default(), policy, source)
    }

    fn assert_local_first(items: &[RecommendationItem]) {
        let first_external = items.iter().position(|i| i.is_external()).unwrap_or(items.len());
        assert!(items[first_external..].iter().all(|i| i.is_external()));
    }

    #[tokio::test]
    async fn test_always_merge_appends_external_after_local() {
        let c = composer(MergePolicy::Always, StubSource::default());
        let items = c
            .recommend("saya suka coding dan sains", &default_catalog(), None, true)
            .await;

        assert_eq!(items.len(), 4);
        assert!(!items[0].is_external());
        assert!(!items[1].is_external());
        assert_eq!(items[2].title(), "Alpha");
        assert_eq!(items[3].title(), "Beta");
        assert_local_first(&items);
        assert_eq!(c.source().queries(), vec!["coding sains saya".to_string()]);
    }

    #[tokio::test]
    async fn test_external_flag_off_never_searches() {
        let c = composer(MergePolicy::Always, StubSource::default());
        let items = c
            .recommend("saya suka coding dan sains", &default_catalog(), None, false)
            .await;
        assert_eq!(items.len(), 2);
        assert!(c.source().queries().is_empty());

        let c = composer(
            MergePolicy::SparseFallback {
                threshold: 5,
                local_limit: None,
            },
            StubSource::default(),
        );
        c.recommend("tidak ada yang cocok", &default_catalog(), None, false)
            .await;
        assert!(c.source().queries().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_fallback_skips_search_when_local_is_rich() {
        let policy = MergePolicy::SparseFallback {
            threshold: 2,
            local_limit: Some(1),
        };
        let c = composer(policy, StubSource::default());
        let items = c
            .recommend("saya suka coding dan sains", &default_catalog(), None, true)
            .await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title(), "Ensiklopedia Sains: Alam Semesta");
        assert!(c.source().queries().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_fallback_searches_when_local_is_sparse() {
        let policy = MergePolicy::SparseFallback {
            threshold: 2,
            local_limit: Some(3),
        };
        let c = composer(policy, StubSource::default());
        let items = c
            .recommend("aku suka bermain komputer", &default_catalog(), None, true)
            .await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title(), "Cara Jago Coding Tanpa Pusing");
        assert_local_first(&items);
        assert_eq!(c.source().queries().len(), 1);
    }

    #[tokio::test]
    async fn test_short_text_skips_search() {
        let c = composer(MergePolicy::Always, StubSource::default());
        let items = c.recommend("ipa", &default_catalog(), None, true).await;
        assert_eq!(items.len(), 1);
        assert!(c.source().queries().is_empty());
    }

    #[tokio::test]
    async fn test_offline_source_returns_local_only() {
        let c = composer(MergePolicy::Always, NoExternal);
        let items = c
            .recommend("aku sedih dan takut ujian besok", &default_catalog(), None, true)
            .await;
        assert!(items.iter().all(|i| !i.is_external()));
        assert!(!items.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_keeps_local_results() {
        let config = ExternalConfig {
            endpoint: "http://127.0.0.1:9/works".into(),
            timeout_secs: 1,
            ..ExternalConfig::default()
        };
        let c = composer(MergePolicy::Always, CrossrefClient::new(config).unwrap());
        let items = c
            .recommend("saya suka coding dan sains", &default_catalog(), None, true)
            .await;

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| !i.is_external()));
    }
}
