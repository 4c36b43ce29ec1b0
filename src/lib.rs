//! # Sobat Pustaka (library root)
//!
//! A school-library assistant. A student pastes free text (a caption, a journal entry, a homework
//! draft) and gets back:
//!
//! - a **safety check**: a 0–100 score with one warning per privacy or toxicity rule that fired
//!   (`scanner`),
//! - a coarse **mood** read from keyword lists (`scanner`),
//! - **recommendations** from the school catalog, ranked by tag overlap and personalized by the
//!   student's interests (`matcher`), optionally followed by references found in a public
//!   scholarly-metadata index (`fetcher`, merged by `composer`).
//!
//! ## Pipeline
//! ```text
//! text ──► Scanner ───────────────────────────────┐
//!   │                                             ├──► AnalysisReport ──► narrator ──► pretty
//!   └────► Composer ──► Matcher (catalog, profile)│
//!               └─────► ReferenceSource (network) ┘
//! ```
//!
//! [`engine::Pustaka`] ties the pieces together; [`store`] persists the catalog and user files.
//!
//! ## Files
//! By default data lives under the per-platform data directory, e.g.:
//!
//! - Linux (XDG): `~/.local/share/pustaka/`
//! - macOS: `~/Library/Application Support/id.sobat-pustaka.pustaka/`
//!
//! and `config.yaml` under the matching config directory (see [`config_dir`]).
//!
//! ## Modules
//! - [`commands`], [`composer`], [`config`], [`engine`], [`fetcher`], [`matcher`],
//!   [`models`], [`narrator`], [`pretty`], [`scanner`], [`store`]

use directories::ProjectDirs;
use std::error::Error;
use std::path::PathBuf;

pub mod commands;
pub mod composer;
pub mod config;
pub mod engine;
pub mod fetcher;
pub mod matcher;
pub mod models;
pub mod narrator;
pub mod pretty;
pub mod scanner;
pub mod store;

fn project_dirs() -> Result<ProjectDirs, Box<dyn Error>> {
    ProjectDirs::from("id", "sobat-pustaka", "pustaka")
        .ok_or_else(|| "Unable to determine project directories".into())
}

/// Return the per-platform configuration directory.
///
/// The directory is **not** created by this function; callers that need it should
/// create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be determined
/// (which is rare but possible in heavily sandboxed environments).
pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Return the per-platform data directory holding `catalog.json` and `users.json`.
pub fn data_dir() -> Result<PathBuf, Box<dyn Error>> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}
