//! # External reference fetcher
//!
//! Looks up extra reading material in a public scholarly-metadata index (Crossref by default)
//! when the local shelves are not enough.
//!
//! The fetcher is **best-effort**:
//!
//! - Queries of 3 characters or fewer are dropped before any request is made.
//! - Exactly one GET is attempted per query, bounded by a hard timeout.
//! - Any failure (connect error, timeout, non-200 status, malformed JSON) yields an empty list.
//!   Nothing is retried and nothing is surfaced to the caller beyond a `warn!` log line.
//! - Successful lookups are memoized for the lifetime of the client.
//!
//! The composer talks to the network through the [`ReferenceSource`] trait so tests and
//! offline runs can swap in [`NoExternal`] or a stub.
//!
//! ## Request shape
//! ```text
//! GET {endpoint}?query=<q>&rows=3&select=title,author,type,container-title,URL[&mailto=<email>]
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::config::ExternalConfig;
use crate::models::ExternalReference;

/// Queries this short (in characters) are never sent.
pub const MIN_QUERY_CHARS: usize = 3;

const SELECT_FIELDS: &str = "title,author,type,container-title,URL";
const UNTITLED: &str = "Untitled";
const UNKNOWN_AUTHOR: &str = "unknown author";
const UNKNOWN_PUBLICATION: &str = "Global Journal/Database";

/// Build a search query from free text: the three longest whitespace-delimited words, ties in
/// original order, joined by spaces.
///
/// Returns `None` when the result is too short to be worth a request.
///
/// ```
/// use sobat_pustaka::fetcher::build_query;
///
/// assert_eq!(
///     build_query("aku suka belajar astronomi dan biologi").as_deref(),
///     Some("astronomi belajar biologi")
/// );
/// assert_eq!(build_query("ya"), None);
/// ```
pub fn build_query(text: &str) -> Option<String> {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    words.truncate(3);
    let query = words.join(" ");
    (query.chars().count() > MIN_QUERY_CHARS).then_some(query)
}

/// Something that can turn a keyword query into external references.
///
/// Implementations must fail open: an unreachable or misbehaving backend yields an empty list.
#[allow(async_fn_in_trait)]
pub trait ReferenceSource {
    async fn fetch(&self, query: &str) -> Vec<ExternalReference>;
}

/// A source that never finds anything. Used for `--offline` runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternal;

impl ReferenceSource for NoExternal {
    async fn fetch(&self, _query: &str) -> Vec<ExternalReference> {
        Vec::new()
    }
}

/// Crossref `works` search client with an in-process memo cache.
pub struct CrossrefClient {
    http: reqwest::Client,
    config: ExternalConfig,
    cache: Mutex<HashMap<String, Vec<ExternalReference>>>,
}

impl CrossrefClient {
    /// Create a client whose requests all carry the configured timeout.
    pub fn new(config: ExternalConfig) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("sobat-pustaka/", env!("CARGO_PKG_VERSION")))
            .build()?;
        debug!("Crossref client created for {}", config.endpoint);
        Ok(Self {
            http,
            config,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Number of memoized queries.
    pub fn cached_queries(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn cached(&self, query: &str) -> Option<Vec<ExternalReference>> {
        self.cache.lock().ok()?.get(query).cloned()
    }

    fn remember(&self, query: &str, references: &[ExternalReference]) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(query.to_string(), references.to_vec());
        }
    }

    async fn request(&self, query: &str) -> Result<Vec<ExternalReference>, Box<dyn Error>> {
        let rows = self.config.rows.to_string();
        let mut params = vec![
            ("query", query),
            ("rows", rows.as_str()),
            ("select", SELECT_FIELDS),
        ];
        if let Some(email) = self.config.contact_email.as_deref() {
            params.push(("mailto", email));
        }

        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(format!("search endpoint returned {status}").into());
        }

        let body: WorksResponse = response.json().await?;
        Ok(body
            .message
            .items
            .into_iter()
            .take(self.config.rows)
            .map(WorkItem::into_reference)
            .collect())
    }
}

impl ReferenceSource for CrossrefClient {
    async fn fetch(&self, query: &str) -> Vec<ExternalReference> {
        let query = query.trim();
        if !self.config.enabled || query.chars().count() <= MIN_QUERY_CHARS {
            return Vec::new();
        }

        if let Some(hit) = self.cached(query) {
            debug!(query, "External search served from cache");
            return hit;
        }

        match self.request(query).await {
            Ok(references) => {
                info!(query, found = references.len(), "External search finished");
                self.remember(query, &references);
                references
            }
            Err(err) => {
                warn!(query, "External search failed: {}", err);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Debug, Deserialize, Default)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WorkItem {
    title: Vec<String>,
    author: Vec<WorkAuthor>,
    #[serde(rename = "container-title")]
    container_title: Vec<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WorkAuthor {
    given: Option<String>,
    family: Option<String>,
}

impl WorkItem {
    fn into_reference(self) -> ExternalReference {
        let title = first_non_empty(self.title).unwrap_or_else(|| UNTITLED.to_string());

        let author = self
            .author
            .into_iter()
            .next()
            .map(|a| {
                format!(
                    "{} {}",
                    a.given.unwrap_or_default(),
                    a.family.unwrap_or_default()
                )
                .trim()
                .to_string()
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let publication = first_non_empty(self.container_title)
            .unwrap_or_else(|| UNKNOWN_PUBLICATION.to_string());

        ExternalReference {
            title,
            author,
            publication,
            link: self.url.filter(|u| !u.trim().is_empty()),
        }
    }
}

fn first_non_empty(values: Vec<String>) -> Option<String> {
    values.into_iter().next().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn config_for(server: &MockServer) -> ExternalConfig {
        ExternalConfig {
            endpoint: server.url("/works"),
            timeout_secs: 1,
            ..ExternalConfig::default()
        }
    }

    fn works_body() -> serde_json::Value {
        json!({
            "status": "ok",
            "message": {
                "items": [
                    {
                        "title": ["Teaching Astronomy in Schools"],
                        "author": [{"given": "Ada", "family": "Lovelace"}, {"given": "X", "family": "Y"}],
                        "container-title": ["Journal of Science Education"],
                        "URL": "https://doi.org/10.1000/astro"
                    },
                    {
                        "author": [{"family": "Hirata"}]
                    },
                    {
                        "title": [],
                        "container-title": [],
                        "URL": ""
                    },
                    {
                        "title": ["Fourth result is dropped"]
                    }
                ]
            }
        })
    }

    #[test]
    fn test_build_query_picks_longest_words() {
        assert_eq!(
            build_query("saya suka coding dan sains").as_deref(),
            Some("coding sains saya")
        );
        assert_eq!(build_query("  ").as_deref(), None);
        assert_eq!(build_query("abc").as_deref(), None);
        assert_eq!(build_query("ab c").as_deref(), Some("ab c"));
    }

    #[tokio::test]
    async fn test_fetch_parses_items() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/works")
                    .query_param("query", "astronomi sekolah")
                    .query_param("rows", "3")
                    .query_param("select", SELECT_FIELDS);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(works_body());
            })
            .await;

        let client = CrossrefClient::new(config_for(&server)).unwrap();
        let refs = client.fetch("astronomi sekolah").await;

        mock.assert_async().await;
        assert_eq!(refs.len(), 3);
        assert_eq!(
            refs[0],
            ExternalReference {
                title: "Teaching Astronomy in Schools".into(),
                author: "Ada Lovelace".into(),
                publication: "Journal of Science Education".into(),
                link: Some("https://doi.org/10.1000/astro".into()),
            }
        );
        assert_eq!(refs[1].title, UNTITLED);
        assert_eq!(refs[1].author, "Hirata");
        assert_eq!(refs[2].author, UNKNOWN_AUTHOR);
        assert_eq!(refs[2].publication, UNKNOWN_PUBLICATION);
        assert_eq!(refs[2].link, None);
        assert_eq!(refs[0].category(), "external");
    }

    #[tokio::test]
    async fn test_contact_email_is_sent_as_mailto() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/works")
                    .query_param("mailto", "perpus@sekolah.sch.id");
                then.status(200).json_body(json!({"message": {"items": []}}));
            })
            .await;

        let config = ExternalConfig {
            contact_email: Some("perpus@sekolah.sch.id".into()),
            ..config_for(&server)
        };
        let client = CrossrefClient::new(config).unwrap();
        assert!(client.fetch("biologi sel").await.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_successful_lookups_are_memoized() {
        let server = MockServer::start_async().await;
        let mut mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/works");
                then.status(200).json_body(works_body());
            })
            .await;

        let client = CrossrefClient::new(config_for(&server)).unwrap();
        let first = client.fetch("sejarah nusantara").await;
        mock.assert_async().await;

        // With the endpoint gone, the second lookup can only come from the cache.
        mock.delete_async().await;
        let second = client.fetch("sejarah nusantara").await;

        assert_eq!(first, second);
        assert_eq!(client.cached_queries(), 1);
    }

    #[tokio::test]
    async fn test_bad_status_fails_open_and_is_not_cached() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/works");
                then.status(503).body("maintenance");
            })
            .await;

        let client = CrossrefClient::new(config_for(&server)).unwrap();
        assert!(client.fetch("fisika kuantum").await.is_empty());
        assert_eq!(client.cached_queries(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_fails_open() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/works");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let client = CrossrefClient::new(config_for(&server)).unwrap();
        assert!(client.fetch("kimia organik").await.is_empty());
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/works");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(works_body());
            })
            .await;

        let client = CrossrefClient::new(config_for(&server)).unwrap();
        let started = Instant::now();
        let refs = client.fetch("geografi indonesia").await;

        assert!(refs.is_empty());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_open() {
        let config = ExternalConfig {
            endpoint: "http://127.0.0.1:9/works".into(),
            timeout_secs: 1,
            ..ExternalConfig::default()
        };
        let client = CrossrefClient::new(config).unwrap();
        assert!(client.fetch("matematika dasar").await.is_empty());
    }

    #[tokio::test]
    async fn test_short_query_never_hits_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/works");
                then.status(200).json_body(works_body());
            })
            .await;

        let client = CrossrefClient::new(config_for(&server)).unwrap();
        assert!(client.fetch("ipa").await.is_empty());
        assert!(client.fetch("  ").await.is_empty());

        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_disabled_client_never_hits_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/works");
                then.status(200).json_body(works_body());
            })
            .await;

        let config = ExternalConfig {
            enabled: false,
            ..config_for(&server)
        };
        let client = CrossrefClient::new(config).unwrap();
        assert!(client.fetch("astronomi").await.is_empty());
        mock.assert_hits_async(0).await;
    }
}
