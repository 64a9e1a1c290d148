//! Operations CLI: the external trigger surface for seeding, sync, pruning
//! and stats. The engine owns no scheduler; cron invokes these commands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use valleyhub_common::Config;
use valleyhub_engine::{
    run_sync, ClaudeClassifier, HttpFeedFetcher, HubStore, PgSnapshotStore,
};
use valleyhub_geo::seed;

#[derive(Parser)]
#[command(name = "hub", about = "ValleyHub geospatial event engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed preset boundaries and the landmark gazetteer.
    Seed,
    /// Fetch regional feeds, classify, enrich and store events.
    Sync,
    /// Remove events older than the cutoff.
    Prune {
        #[arg(long, default_value_t = 30)]
        max_age_days: i64,
    },
    /// Print store counters.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Seed => {
            let config = Config::read_only_from_env();
            let mut store = open_store(&config.database_url).await?;
            let fences = store.ingest_geofences(&seed::preset_boundaries()).await?;
            let landmarks = store.upsert_landmarks(seed::preset_landmarks()?).await?;
            println!("Seeded {fences} geofences, {landmarks} landmarks");
        }
        Command::Sync => {
            let config = Config::from_env();
            let mut store = open_store(&config.database_url).await?;
            let fetcher = HttpFeedFetcher::new();
            let classifier = ClaudeClassifier::new(&config.anthropic_api_key);
            let count = run_sync(
                &mut store,
                &fetcher,
                &classifier,
                config.sync_items_per_source,
            )
            .await?;
            println!("Ingested {count} items");
        }
        Command::Prune { max_age_days } => {
            let config = Config::read_only_from_env();
            let mut store = open_store(&config.database_url).await?;
            let removed = store.prune(max_age_days).await?;
            println!("Removed {removed} events");
        }
        Command::Stats => {
            let config = Config::read_only_from_env();
            let mut store = open_store(&config.database_url).await?;
            let stats = store.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

async fn open_store(database_url: &str) -> Result<HubStore> {
    let backend = PgSnapshotStore::connect(database_url).await?;
    Ok(HubStore::new(Box::new(backend)))
}
