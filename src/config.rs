//! This module provides functionality for loading and handling the application's configuration.
//!
//! It defines the [`PustakaConfig`] struct, which holds every tunable of the analysis pipeline
//! (penalties, keyword lists, boosts, the merge policy and the external search settings), and a
//! [`load_config`] function to load the configuration from a YAML file.
//!
//! Every field has a default, so a config file only needs to name what it changes:
//!
//! ```yaml
//! matcher:
//!   personalization_boost: 3
//! merge_policy:
//!   kind: sparse-fallback
//!   threshold: 2
//!   local_limit: 3
//! external:
//!   timeout_secs: 5
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use sobat_pustaka::config::load_config;
//!
//! let config = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config.merge_policy);
//! ```

use serde::{Deserialize, Serialize};
use std::{error::Error, fs, path::PathBuf, time::Duration};

use tracing::*;

/// Represents the application's configuration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(default)]
pub struct PustakaConfig {
    /// Catalog JSON file. Defaults to `<data_dir>/catalog.json`.
    pub catalog_path: Option<PathBuf>,

    /// User JSON file. Defaults to `<data_dir>/users.json`.
    pub users_path: Option<PathBuf>,

    pub scanner: ScannerConfig,

    pub matcher: MatcherConfig,

    /// How local and external results are combined.
    pub merge_policy: MergePolicy,

    pub external: ExternalConfig,
}

impl PustakaConfig {
    /// Resolve the catalog file, falling back to the per-platform data directory.
    pub fn catalog_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        match &self.catalog_path {
            Some(path) => Ok(path.clone()),
            None => Ok(crate::data_dir()?.join("catalog.json")),
        }
    }

    /// Resolve the user file, falling back to the per-platform data directory.
    pub fn users_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        match &self.users_path {
            Some(path) => Ok(path.clone()),
            None => Ok(crate::data_dir()?.join("users.json")),
        }
    }
}

/// Penalty subtracted from the starting safety score of 100 for each triggered rule.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct Penalties {
    pub email: i32,
    pub phone: i32,
    pub national_id: i32,
    pub address: i32,
    pub toxic: i32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            email: 20,
            phone: 30,
            national_id: 50,
            address: 20,
            toxic: 25,
        }
    }
}

/// Rules and keyword lists for the privacy/toxicity/mood scanner.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    pub penalties: Penalties,

    /// Check for 16-digit ID/card numbers.
    pub check_national_id: bool,

    /// Check for street-address markers (`Jl.`, `Jalan`, `Rumah`, `Komplek`).
    pub check_address: bool,

    /// Floor the safety score at 0.
    pub clamp_score: bool,

    pub toxic_words: Vec<String>,
    pub anxiety_words: Vec<String>,
    pub positive_words: Vec<String>,
    pub academic_words: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            penalties: Penalties::default(),
            check_national_id: true,
            check_address: true,
            clamp_score: true,
            toxic_words: words(&["bodoh", "tolol", "jelek", "mati", "benci", "sampah", "gila"]),
            anxiety_words: words(&["takut", "cemas", "bingung", "sedih", "stres", "capek", "galau"]),
            positive_words: words(&["senang", "bahagia", "suka", "semangat", "seru", "gembira"]),
            academic_words: words(&["ujian", "tugas", "pr", "belajar", "ulangan", "nilai", "pelajaran"]),
        }
    }
}

/// Settings for the local catalog ranker.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct MatcherConfig {
    /// Added once per profile interest that hits an entry's tags or category.
    pub personalization_boost: u32,

    pub empathy: EmpathyRule,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            personalization_boost: 2,
            empathy: EmpathyRule::default(),
        }
    }
}

/// Hand-tuned rule: when the text sounds sad or afraid, self-development titles get a boost even
/// without tag overlap.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct EmpathyRule {
    pub enabled: bool,
    pub trigger_words: Vec<String>,
    /// Category names (compared case-insensitively) that receive the boost.
    pub categories: Vec<String>,
    pub boost: u32,
}

impl Default for EmpathyRule {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_words: words(&["sedih", "takut", "galau"]),
            categories: words(&["pengembangan diri", "self-development"]),
            boost: 2,
        }
    }
}

/// How the composer combines local matches with external references.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Always append external results when the caller asks for them.
    #[default]
    Always,

    /// Only search externally when fewer than `threshold` local matches were found.
    /// Local results are cut to `local_limit` when set.
    SparseFallback {
        threshold: usize,
        #[serde(default)]
        local_limit: Option<usize>,
    },
}

/// Settings for the external scholarly-metadata search.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct ExternalConfig {
    /// Master switch; when false no request is ever sent.
    pub enabled: bool,

    pub endpoint: String,

    /// Maximum number of results requested and kept.
    pub rows: usize,

    /// Hard request timeout; values below one second are raised to one.
    pub timeout_secs: u64,

    /// Sent as `mailto` so the API can route us to its polite pool.
    pub contact_email: Option<String>,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.crossref.org/works".to_string(),
            rows: 3,
            timeout_secs: 3,
            contact_email: None,
        }
    }
}

impl ExternalConfig {
    /// The request timeout actually applied, never zero.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs < MIN_TIMEOUT_SECS {
            warn!(
                "timeout_secs = {} is too short, using {}s",
                self.timeout_secs, MIN_TIMEOUT_SECS
            );
        }
        Duration::from_secs(self.timeout_secs.max(MIN_TIMEOUT_SECS))
    }
}

const MIN_TIMEOUT_SECS: u64 = 1;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// Loads the application's configuration from a YAML file.
///
/// # Parameters
///
/// - `file`: The path to the YAML configuration file.
///
/// # Returns
///
/// - `Ok(PustakaConfig)`: The loaded configuration, with defaults for omitted fields.
/// - `Err(Box<dyn Error>)`: An error occurred while reading the file or parsing the YAML.
pub fn load_config(file: &str) -> Result<PustakaConfig, Box<dyn Error>> {
    debug!("Loading config: {:?}", file);
    let content = fs::read_to_string(file)?;
    let config: PustakaConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load the config at `file`, or fall back to defaults when the file does not exist.
///
/// A file that exists but fails to parse is still an error.
pub fn load_config_or_default(file: &str) -> Result<PustakaConfig, Box<dyn Error>> {
    if !std::path::Path::new(file).exists() {
        warn!("No config at {}, using defaults", file);
        return Ok(PustakaConfig::default());
    }
    load_config(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
catalog_path: "/tmp/catalog.json"
scanner:
  clamp_score: false
  toxic_words: ["jahat"]
matcher:
  personalization_boost: 3
merge_policy:
  kind: sparse-fallback
  threshold: 2
  local_limit: 3
external:
  timeout_secs: 5
  contact_email: "pustakawan@sekolah.sch.id"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path().to_str().unwrap());

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("/tmp/catalog.json")));
        assert!(!config.scanner.clamp_score);
        assert_eq!(config.scanner.toxic_words, vec!["jahat".to_string()]);
        // Untouched fields keep their defaults.
        assert_eq!(config.scanner.penalties.email, 20);
        assert!(!config.scanner.anxiety_words.is_empty());
        assert_eq!(config.matcher.personalization_boost, 3);
        assert_eq!(
            config.merge_policy,
            MergePolicy::SparseFallback {
                threshold: 2,
                local_limit: Some(3)
            }
        );
        assert_eq!(config.external.timeout_secs, 5);
        assert_eq!(config.external.rows, 3);
        assert_eq!(
            config.external.contact_email.as_deref(),
            Some("pustakawan@sekolah.sch.id")
        );
    }

    #[test]
    fn test_zero_timeout_is_raised_to_one_second() {
        let external = ExternalConfig {
            timeout_secs: 0,
            ..ExternalConfig::default()
        };
        assert_eq!(external.timeout(), Duration::from_secs(1));
        assert_eq!(ExternalConfig::default().timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_config_empty_document_is_default() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{}}").unwrap();

        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config, PustakaConfig::default());
        assert_eq!(config.merge_policy, MergePolicy::Always);
    }

    #[test]
    fn test_load_config_invalid_file() {
        let config = load_config("non/existent/path");
        assert!(config.is_err());
    }

    #[test]
    fn test_load_config_or_default_missing_file() {
        let config = load_config_or_default("non/existent/path").unwrap();
        assert_eq!(config, PustakaConfig::default());
    }

    #[test]
    fn test_load_config_invalid_format() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"invalid: config: format"#).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap());
        assert!(config.is_err());
    }

    #[test]
    fn test_default_config_serializes_to_yaml() {
        let yaml = serde_yaml::to_string(&PustakaConfig::default()).unwrap();
        assert!(yaml.contains("kind: always"));
        let back: PustakaConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, PustakaConfig::default());
    }
}
