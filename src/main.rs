//! Main module for the Sobat Pustaka CLI application (pustaka).
//!
//! Parses the command line, loads the configuration and dispatches to the library.
//!
//! # Examples
//!
//! ```sh
//! pustaka check "aku suka coding tapi takut nilai turun"
//! pustaka check "hubungi aku di budi@example.com" --offline --json
//! pustaka catalog add --title "Bumi" --author "Tere Liye" --tags "fantasi, petualangan" \
//!     --category Fiksi --shelf A-09
//! pustaka init
//! ```

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::OnceCell;
use std::{error::Error, fs, time::Duration};
use tracing::{debug, info};

use sobat_pustaka::{
    commands::{CatalogCommands, Cli, Commands},
    config::{self, PustakaConfig},
    config_dir,
    engine::{Pustaka, RequestContext},
    fetcher::{CrossrefClient, NoExternal, ReferenceSource},
    models::{CatalogEntry, UserProfile, parse_tag_list},
    narrator, pretty,
    store::{CatalogStore, UserStore},
};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Load configuration, parse arguments and execute the requested command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be parsed, a store cannot be written,
/// or a command is given invalid input.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml"),
    };
    debug!("Loading config from: {}", config_path.display());
    let pustaka_config = config::load_config_or_default(&config_path.to_string_lossy())?;

    match cli.command {
        Commands::Check {
            text,
            user,
            password,
            offline,
            json,
        } => {
            let profile = match user {
                Some(username) => {
                    let users = UserStore::new(pustaka_config.users_path()?);
                    let profile = users.sign_in(&username, password.as_deref())?;
                    if profile.is_none() {
                        tracing::warn!("Unknown user {}, continuing as guest", username);
                    }
                    profile
                }
                None => None,
            };
            let ctx = RequestContext::new(text)
                .with_profile(profile)
                .with_external(!offline);

            let catalog = CatalogStore::new(pustaka_config.catalog_path()?);
            if offline || !pustaka_config.external.enabled {
                let engine = Pustaka::new(pustaka_config, catalog, NoExternal);
                check(&engine, &ctx, json).await?;
            } else {
                let client = CrossrefClient::new(pustaka_config.external.clone())?;
                let engine = Pustaka::new(pustaka_config, catalog, client);
                check(&engine, &ctx, json).await?;
            }
        }
        Commands::Catalog { command } => {
            let catalog = CatalogStore::new(pustaka_config.catalog_path()?);
            match command {
                CatalogCommands::List => list_catalog(&catalog),
                CatalogCommands::Add {
                    title,
                    author,
                    tags,
                    category,
                    shelf,
                    competency,
                } => {
                    let mut entry =
                        CatalogEntry::new(&title, &author, parse_tag_list(&tags), &category, &shelf);
                    entry.competency = competency;
                    catalog.append(entry)?;
                    println!("Added \"{}\" to {}", title, catalog.path().display());
                }
            }
        }
        Commands::Register {
            username,
            display_name,
            interests,
            password,
        } => {
            let users = UserStore::new(pustaka_config.users_path()?);
            let profile: UserProfile =
                users.register(&username, &display_name, &password, parse_tag_list(&interests))?;
            println!(
                "Registered {} with {} interest(s)",
                profile.display_name,
                profile.interests.len()
            );
        }
        Commands::Init => {
            init()?;
        }
    }

    Ok(())
}

async fn check<S: ReferenceSource>(
    engine: &Pustaka<S>,
    ctx: &RequestContext,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Checking your text and searching the shelves...");

    let report = engine.analyze(ctx).await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let name = ctx.profile.as_ref().map(|p| p.display_name.as_str());
        pretty::print_pretty(&narrator::narrate(&report, name))?;
    }
    Ok(())
}

fn list_catalog(catalog: &CatalogStore) {
    for entry in catalog.load().iter() {
        let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
        println!(
            "{:<6} {} by {} [{}] ({})",
            entry.shelf,
            entry.title,
            entry.author,
            entry.category,
            tags.join(", ")
        );
    }
}

/// Writes a default `config.yaml` into the config directory unless one already exists.
fn init() -> Result<(), Box<dyn Error>> {
    let config_dir = config_dir()?;
    info!("Creating config directory: {}", config_dir.display());
    fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.yaml");
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    info!("Creating config file: {}", config_path.display());
    let config_yaml = serde_yaml::to_string(&PustakaConfig::default())?;
    fs::write(&config_path, config_yaml)?;
    println!("Wrote {}", config_path.display());

    Ok(())
}
