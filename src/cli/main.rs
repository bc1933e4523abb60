use anyhow::Context;
use clap::{Parser, Subcommand};
use portfolio_backend::{
    config::Config,
    migration::LegacyImporter,
    search::{EntityKind, SearchIndexSynchronizer, SearchIndexes},
    state::create_store,
};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "portfolio-cli")]
#[command(about = "Portfolio Backend CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a legacy JSON backup directory into the store
    Migrate {
        /// Directory holding tags.json, blogs.json, ...
        #[arg(short, long, value_name = "DIR")]
        backup: PathBuf,

        /// Do not rebuild the search indexes afterwards
        #[arg(long)]
        skip_reindex: bool,
    },

    /// Rebuild the search indexes from the store
    Reindex {
        /// Only rebuild one kind: blog, job or skill
        #[arg(short, long)]
        kind: Option<EntityKind>,
    },

    /// Check server health
    Health {
        #[arg(short, long, default_value = "http://localhost:8080")]
        endpoint: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_backend=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            backup,
            skip_reindex,
        } => {
            let config = Config::load().context("Failed to load configuration")?;
            let store = create_store(&config.store)?;

            let report = LegacyImporter::new(store.clone())
                .import_dir(&backup)
                .await
                .with_context(|| format!("Import from {} failed", backup.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !skip_reindex {
                let indexes = SearchIndexes::open(&config.search)?;
                let reports = SearchIndexSynchronizer::new(indexes, store)
                    .full_sync_all()
                    .await?;
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }

        Commands::Reindex { kind } => {
            let config = Config::load().context("Failed to load configuration")?;
            let store = create_store(&config.store)?;
            let indexes = SearchIndexes::open(&config.search)?;
            let synchronizer = SearchIndexSynchronizer::new(indexes, store);

            let reports = match kind {
                Some(kind) => vec![synchronizer.full_sync(kind).await?],
                None => synchronizer.full_sync_all().await?,
            };
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }

        Commands::Health { endpoint } => {
            let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
            let response = client
                .get(format!("{}/health", endpoint.trim_end_matches('/')))
                .send()
                .await
                .with_context(|| format!("Could not reach {}", endpoint))?;

            let status = response.status();
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            if !status.is_success() {
                anyhow::bail!("Server reported {}", status);
            }
        }
    }

    Ok(())
}
