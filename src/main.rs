mod collector;
mod config;
mod dedup;
mod error;
mod importer;
mod location;
mod models;
mod scrapers;
mod store;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::collector::Collector;
use crate::config::AppConfig;
use crate::models::{PropertyFilter, Source};
use crate::store::{JsonFileStore, PropertyStore};

#[derive(Parser)]
#[command(name = "rent-collector", about = "Collects Taiwanese rental listings into one searchable store", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    config: AppConfig,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the site scrapers and store every new listing
    Scrape {
        /// Sources to run, in order: 591, sinyi, yungching (default: all)
        #[arg(short, long = "source")]
        sources: Vec<Source>,

        /// Region to narrow the search to, e.g. 台北市
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Import listings from a comma-separated file
    Import {
        file: PathBuf,
    },

    /// Fetch one listing page and store it
    Extract {
        url: String,
    },

    /// List stored listings
    List {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        min_price: Option<i64>,
        #[arg(long)]
        max_price: Option<i64>,
        #[arg(long)]
        search: Option<String>,
    },

    /// Cities that have stored listings
    Cities,

    /// Districts of a city that have stored listings
    Districts {
        city: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = match cli.verbose {
        0 => "rent_collector=info,warn",
        1 => "rent_collector=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config;
    let store = Arc::new(JsonFileStore::open(&config.store_path).await?);
    info!("Using store {}", store.path().display());

    match cli.command {
        Command::Scrape { sources, region } => {
            let fetcher = config.fetch.build_fetcher()?;
            let collector = Collector::new(store, scrapers::default_sources(fetcher)?);
            let summary = collector
                .run_import(&sources, region.as_deref(), config.user_id)
                .await;
            print_json(&summary)?;
        }

        Command::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let collector = Collector::new(store, Vec::new());
            let report = collector.import_csv(&text, config.user_id).await;
            print_json(&report)?;
        }

        Command::Extract { url } => {
            let fetcher = config.fetch.build_fetcher()?;
            let collector = Collector::new(store, scrapers::default_sources(fetcher)?);
            let outcome = collector.import_listing(&url, config.user_id).await?;
            print_json(&outcome)?;
        }

        Command::List {
            city,
            district,
            min_price,
            max_price,
            search,
        } => {
            let filter = PropertyFilter {
                city,
                district,
                min_price,
                max_price,
                search,
            };
            let properties = store.list_properties(&filter).await?;
            info!("{} properties match", properties.len());
            print_json(&properties)?;
        }

        Command::Cities => print_json(&store.cities().await?)?,

        Command::Districts { city } => print_json(&store.districts(&city).await?)?,
    }

    Ok(())
}
