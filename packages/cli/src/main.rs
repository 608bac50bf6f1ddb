#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the hazard fence tools.
//!
//! `serve` runs the API server; `activate` runs advisory-driven fence
//! activation passes, once or on an interval; `migrate` and `fences`
//! are operational helpers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use hazard_fence_activator::{ActivatorConfig, run_pass};
use hazard_fence_advisory::AdvisorySource;
use hazard_fence_advisory::bulletin::BulletinSource;
use hazard_fence_advisory::weather_api::WeatherApiSource;
use hazard_fence_database::{DatabaseFenceStore, db, queries, run_migrations};
use hazard_fence_geocoder::{NominatimClient, PlaceResolver};

#[derive(Parser)]
#[command(name = "hazard_fence", about = "Hazard fence server and activation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which advisory source the activation pass consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Weather API alerts endpoint (needs `WEATHER_API_KEY`).
    WeatherApi,
    /// Scraped agency bulletin page (needs `ADVISORY_BULLETIN_URL`).
    Bulletin,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve,
    /// Run advisory-driven fence activation passes
    Activate {
        /// Repeat every N seconds; if not set, runs a single pass
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Advisory source to consult
        #[arg(long, value_enum, default_value = "weather-api")]
        source: SourceKind,
        /// Reverse-geocode fence anchors so lookups use place names
        #[arg(long)]
        geocode: bool,
    },
    /// Run database migrations
    Migrate,
    /// List all fences and their activation state
    Fences,
}

#[actix_rt::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            hazard_fence_server::run_server().await?;
        }
        Commands::Migrate => {
            log::info!("Running database migrations...");
            let db = db::connect_from_env().await?;
            run_migrations(db.as_ref()).await?;
            log::info!("Migrations complete.");
        }
        Commands::Fences => {
            let db = db::connect_from_env().await?;
            run_migrations(db.as_ref()).await?;
            let fences = queries::list_fences(db.as_ref()).await?;
            println!("{:<6} {:<10} {:<16} NAME", "ID", "ACTIVE", "CATEGORY");
            println!("{}", "-".repeat(60));
            for fence in &fences {
                println!(
                    "{:<6} {:<10} {:<16} {}",
                    fence.id,
                    fence.is_active,
                    fence.category.as_ref(),
                    fence.name
                );
            }
        }
        Commands::Activate {
            interval_secs,
            source,
            geocode,
        } => {
            let db: Arc<dyn switchy_database::Database> =
                Arc::from(db::connect_from_env().await?);
            run_migrations(db.as_ref()).await?;

            let source: Box<dyn AdvisorySource> = match source {
                SourceKind::WeatherApi => Box::new(WeatherApiSource::from_env()?),
                SourceKind::Bulletin => Box::new(BulletinSource::from_env()?),
            };
            let resolver = geocode.then(NominatimClient::from_env);
            let store = DatabaseFenceStore::new(db.clone());
            let config = ActivatorConfig::from_env();

            loop {
                let start = Instant::now();
                let fences = queries::list_fences(db.as_ref()).await?;
                let summary = run_pass(
                    &fences,
                    source.as_ref(),
                    resolver.as_ref().map(|r| r as &dyn PlaceResolver),
                    &store,
                    &config,
                )
                .await;
                log::info!(
                    "Activation pass complete in {:.1}s: {} evaluated, {} activated, \
                     {} deactivated, {} unchanged, {} lookup failures, {} store failures",
                    start.elapsed().as_secs_f64(),
                    summary.evaluated,
                    summary.activated,
                    summary.deactivated,
                    summary.unchanged,
                    summary.lookup_failures,
                    summary.store_failures
                );

                let Some(secs) = interval_secs else { break };
                tokio::time::sleep(Duration::from_secs(secs)).await;
            }
        }
    }

    Ok(())
}
