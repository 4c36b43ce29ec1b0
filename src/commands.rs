//! This module defines the command-line interface for the application using `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line arguments,
//! and a `Commands` enum that represents the available subcommands and their
//! options.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use sobat_pustaka::commands::{Cli, Commands};
//!
//! let cli = Cli::parse();
//! if let Commands::Check { text, .. } = cli.command {
//!     println!("checking {text}");
//! }
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// Path to config.yaml. Defaults to the per-platform config directory.
    #[arg(long, global = true, env = "PUSTAKA_CONFIG")]
    pub config: Option<PathBuf>,

    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Check a caption, journal entry or draft and recommend books for it.
    #[clap(name = "check", alias = "c")]
    Check {
        /// The text to analyse.
        text: String,

        /// Registered username to personalize recommendations for.
        #[arg(short = 'u', long = "user")]
        user: Option<String>,

        /// Password for `--user`. When set, the credentials must match.
        #[arg(long, env = "PUSTAKA_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Only search the school catalog.
        #[arg(long)]
        offline: bool,

        /// Print the full report as JSON instead of a message.
        #[arg(long)]
        json: bool,
    },

    /// Librarian tools for the school catalog.
    #[clap(name = "catalog")]
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Register a student account.
    #[clap(name = "register")]
    Register {
        #[arg(long)]
        username: String,

        #[arg(long = "display-name")]
        display_name: String,

        /// Comma-separated interests, e.g. "coding, sains".
        #[arg(long, default_value = "")]
        interests: String,

        #[arg(long, env = "PUSTAKA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Write a default config.yaml into the config directory.
    Init,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// Print every entry in the catalog.
    List,

    /// Add a book to the catalog.
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        /// Comma-separated keywords, e.g. "hobi, pelajaran, emosi".
        #[arg(long)]
        tags: String,

        #[arg(long)]
        category: String,

        /// Shelf code, e.g. A-01.
        #[arg(long)]
        shelf: String,

        /// Competency-dimension label.
        #[arg(long)]
        competency: Option<String>,
    },
}
