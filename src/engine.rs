//! # Analysis engine
//!
//! [`Pustaka`] wires the scanner, the composer and the catalog store together. Each call to
//! [`Pustaka::analyze`] is independent: everything request-specific travels in a
//! [`RequestContext`], and the only shared state is the cached catalog.
//!
//! ```no_run
//! use sobat_pustaka::config::PustakaConfig;
//! use sobat_pustaka::engine::{Pustaka, RequestContext};
//! use sobat_pustaka::fetcher::NoExternal;
//! use sobat_pustaka::store::CatalogStore;
//!
//! # async fn demo() {
//! let engine = Pustaka::new(PustakaConfig::default(), CatalogStore::new("catalog.json"), NoExternal);
//! let report = engine
//!     .analyze(&RequestContext::new("aku suka coding").with_external(false))
//!     .await;
//! println!("score {}", report.scan.safety_score);
//! # }
//! ```

use serde::Serialize;

use crate::composer::Composer;
use crate::config::PustakaConfig;
use crate::fetcher::ReferenceSource;
use crate::models::{RecommendationItem, ScanResult, UserProfile};
use crate::scanner::Scanner;
use crate::store::CatalogStore;

/// Everything one analysis request needs besides the shared catalog.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub text: String,
    /// Signed-in student; `None` for guests.
    pub profile: Option<UserProfile>,
    /// Allow searching outside the school catalog.
    pub use_external: bool,
}

impl RequestContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            profile: None,
            use_external: true,
        }
    }

    pub fn with_profile(mut self, profile: Option<UserProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_external(mut self, use_external: bool) -> Self {
        self.use_external = use_external;
        self
    }
}

/// Result of analysing one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub scan: ScanResult,
    pub recommendations: Vec<RecommendationItem>,
}

impl AnalysisReport {
    pub fn empty() -> Self {
        Self {
            scan: ScanResult::clean(),
            recommendations: Vec::new(),
        }
    }
}

pub struct Pustaka<S> {
    scanner: Scanner,
    composer: Composer<S>,
    catalog: CatalogStore,
}

impl<S: ReferenceSource> Pustaka<S> {
    pub fn new(config: PustakaConfig, catalog: CatalogStore, source: S) -> Self {
        Self {
            scanner: Scanner::new(config.scanner),
            composer: Composer::new(config.matcher, config.merge_policy, source),
            catalog,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Scan `ctx.text` and build its recommendation list.
    ///
    /// Blank text is not analysed: the report is neutral and neither the catalog nor the
    /// network is touched.
    pub async fn analyze(&self, ctx: &RequestContext) -> AnalysisReport {
        if ctx.text.trim().is_empty() {
            return AnalysisReport::empty();
        }

        let scan = self.scanner.scan(&ctx.text);
        let catalog = self.catalog.load();
        let recommendations = self
            .composer
            .recommend(&ctx.text, &catalog, ctx.profile.as_ref(), ctx.use_external)
            .await;

        tracing::info!(
            score = scan.safety_score,
            recommendations = recommendations.len(),
            "Analysis finished"
        );

        AnalysisReport {
            scan,
            recommendations,
        }
    }
}
