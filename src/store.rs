//! # JSON stores
//!
//! Flat-file persistence for the catalog and the registered users. Both files are plain UTF-8
//! JSON arrays of records.
//!
//! ## Catalog
//! [`CatalogStore`] loads lazily on first access and keeps the parsed catalog cached behind an
//! `RwLock`. Recovery rules:
//!
//! - **Missing file**: the [`default_catalog`] seed is written to disk and returned.
//! - **Malformed file**: the seed is returned (and logged); the broken file is left untouched so a
//!   librarian can repair it.
//! - **Malformed record**: that record is skipped with a warning; the rest of the file is used.
//!
//! [`CatalogStore::append`] rewrites the whole file and invalidates the cache. It rereads the file
//! strictly first and refuses to write when any part of it does not parse.
//!
//! ## Users
//! [`UserStore`] holds [`UserRecord`]s with a SHA-256 password hash. A missing or malformed file
//! reads as an empty list for lookups; registration refuses to write over a malformed file.
//!
//! ## Atomic writes
//! Every write goes to a temporary file in the target directory which is then renamed over the
//! target, so readers never observe a half-written file.

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::models::{CatalogEntry, UserProfile, UserRecord, normalize_tags};

/// The school's starter collection, used when no catalog file exists yet.
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(
            "Laskar Pelangi",
            "Andrea Hirata",
            ["motivasi", "sekolah", "perjuangan", "mimpi"],
            "Fiksi",
            "A-01",
        )
        .with_competency("Mandiri"),
        CatalogEntry::new(
            "Dunia Sophie (Filsafat untuk Remaja)",
            "Jostein Gaarder",
            ["misteri", "berpikir", "sejarah", "logika"],
            "Novel Edukasi",
            "B-03",
        )
        .with_competency("Bernalar Kritis"),
        CatalogEntry::new(
            "Ensiklopedia Sains: Alam Semesta",
            "Tim National Geographic",
            ["sains", "antariksa", "ipa", "fakta"],
            "Ensiklopedia",
            "C-12",
        )
        .with_competency("Bernalar Kritis"),
        CatalogEntry::new(
            "Cara Jago Coding Tanpa Pusing",
            "Budi Raharjo",
            ["komputer", "coding", "game", "teknologi"],
            "Keterampilan",
            "D-05",
        )
        .with_competency("Kreatif"),
        CatalogEntry::new(
            "Laut Bercerita",
            "Leila S. Chudori",
            ["sejarah", "persahabatan", "sosial", "sedih"],
            "Fiksi Sejarah",
            "A-02",
        )
        .with_competency("Berkebinekaan Global"),
        CatalogEntry::new(
            "Atomic Habits (Versi Remaja)",
            "James Clear",
            ["psikologi", "kebiasaan", "disiplin", "mental"],
            "Pengembangan Diri",
            "E-01",
        )
        .with_competency("Mandiri"),
    ]
}

/// Serialize `records` as pretty JSON and atomically replace `path` with it.
fn write_json_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<(), Box<dyn Error>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut temp, records)?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

/// Read a JSON array from `path`, skipping records that do not parse.
///
/// `Ok(None)` means the file does not exist. A file that is not a JSON array is an error.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, Box<dyn Error>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&content)?;

    let records = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Skipping record {} in {}: {}", index, path.display(), err);
                None
            }
        })
        .collect();
    Ok(Some(records))
}

/// Read a JSON array from `path`, failing on the first record that does not parse.
///
/// Used before rewriting a file so nothing the lenient reader skipped gets dropped.
fn read_json_strict<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, Box<dyn Error>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let records = serde_json::from_str(&content)
        .map_err(|err| format!("{} is malformed, not writing over it: {}", path.display(), err))?;
    Ok(Some(records))
}

/// File-backed catalog with a process-wide read cache.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    cache: RwLock<Option<Arc<Vec<CatalogEntry>>>>,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the catalog, reading it from disk on first use.
    ///
    /// Never fails: unreadable files fall back to [`default_catalog`].
    pub fn load(&self) -> Arc<Vec<CatalogEntry>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(catalog) = cache.as_ref() {
                return Arc::clone(catalog);
            }
        }

        let catalog = Arc::new(self.read_from_disk());
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(Arc::clone(&catalog));
        }
        catalog
    }

    fn read_from_disk(&self) -> Vec<CatalogEntry> {
        match read_json::<CatalogEntry>(&self.path) {
            Ok(Some(entries)) => {
                debug!("Loaded {} catalog entries from {}", entries.len(), self.path.display());
                entries
            }
            Ok(None) => {
                info!("Seeding catalog at {}", self.path.display());
                let seed = default_catalog();
                if let Err(err) = write_json_atomic(&self.path, &seed) {
                    warn!("Could not write seed catalog: {}", err);
                }
                seed
            }
            Err(err) => {
                warn!(
                    "Catalog at {} is unreadable ({}), using default collection",
                    self.path.display(),
                    err
                );
                default_catalog()
            }
        }
    }

    /// Add an entry, rewrite the file and drop the cached catalog.
    ///
    /// A missing file starts from [`default_catalog`].
    ///
    /// # Errors
    /// - The entry has an empty title.
    /// - The existing file does not parse; it is left as it was.
    /// - The file cannot be written.
    pub fn append(&self, mut entry: CatalogEntry) -> Result<(), Box<dyn Error>> {
        if entry.title.trim().is_empty() {
            return Err("catalog entry needs a title".into());
        }
        entry.tags = normalize_tags(&entry.tags);

        let mut entries = read_json_strict(&self.path)?.unwrap_or_else(default_catalog);
        entries.push(entry);
        write_json_atomic(&self.path, &entries)?;
        self.invalidate();

        info!("Catalog now holds {} entries", entries.len());
        Ok(())
    }

    /// Forget the cached catalog so the next [`load`](Self::load) rereads the file.
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
    }
}

/// File-backed list of registered users.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Vec<UserRecord> {
        match read_json::<UserRecord>(&self.path) {
            Ok(records) => records.unwrap_or_default(),
            Err(err) => {
                warn!("User file {} is unreadable: {}", self.path.display(), err);
                Vec::new()
            }
        }
    }

    fn append(&self, record: UserRecord) -> Result<(), Box<dyn Error>> {
        let mut records = read_json_strict(&self.path)?.unwrap_or_default();
        records.push(record);
        write_json_atomic(&self.path, &records)
    }

    /// Register a new user and return their profile.
    ///
    /// # Errors
    /// Fails on an empty or already-taken username, when the existing file does not parse, or
    /// when the file cannot be written.
    pub fn register<I, S>(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
        interests: I,
    ) -> Result<UserProfile, Box<dyn Error>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let username = username.trim();
        if username.is_empty() {
            return Err("username must not be empty".into());
        }
        if self.find(username).is_some() {
            return Err(format!("username '{username}' is already registered").into());
        }

        let record = UserRecord {
            username: username.to_string(),
            display_name: display_name.trim().to_string(),
            password_hash: hash_password(password),
            interests: normalize_tags(interests),
        };
        let profile = record.profile();
        self.append(record)?;

        info!("Registered user {}", username);
        Ok(profile)
    }

    fn find(&self, username: &str) -> Option<UserRecord> {
        self.load().into_iter().find(|r| r.username == username)
    }

    pub fn lookup(&self, username: &str) -> Option<UserProfile> {
        self.find(username.trim()).map(|r| r.profile())
    }

    /// Return the profile when `password` matches the stored hash.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<UserProfile> {
        self.find(username.trim())
            .filter(|r| r.password_hash == hash_password(password))
            .map(|r| r.profile())
    }

    /// Resolve the profile for a request.
    ///
    /// With a password the credentials must match. Without one the profile is looked up by name,
    /// and an unknown name yields `None` (guest).
    ///
    /// # Errors
    /// A password was given and does not match the user.
    pub fn sign_in(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<Option<UserProfile>, Box<dyn Error>> {
        match password {
            Some(password) => self
                .authenticate(username, password)
                .map(Some)
                .ok_or_else(|| format!("wrong username or password for '{}'", username.trim()).into()),
            None => Ok(self.lookup(username)),
        }
    }
}

fn hash_password(password: &str) -> String {
    sha256::digest(password)
}
