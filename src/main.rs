//! Strategy Forge - main entry point
//!
//! Command-line front end over the extraction and lifecycle engines:
//! compose drafts from natural language, then save, deploy, publish,
//! stop, refresh, and delete them against a file-backed store and the
//! simulated chain backend.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use strategy_forge::chain::SimulatedChainClient;
use strategy_forge::composer;
use strategy_forge::config::EngineConfig;
use strategy_forge::lifecycle::{LifecycleEngine, PerformanceSample};
use strategy_forge::store::JsonFileStore;
use strategy_forge::StrategyResult;

#[derive(Parser, Debug)]
#[command(name = "strategy-forge")]
#[command(about = "Natural-language crypto strategy builder with simulated on-chain lifecycle", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory for the file-backed store (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose a draft strategy from a description and print it
    Compose {
        /// Free-form strategy description
        text: String,
    },

    /// Compose a draft strategy and save it to the collection
    Save {
        /// Free-form strategy description
        text: String,
    },

    /// List saved strategies
    List,

    /// List published strategies (the marketplace feed)
    Market,

    /// Deploy a saved strategy by position, activating it on-chain
    Deploy {
        /// Position in the saved collection (from `list`)
        index: usize,
    },

    /// Stop an active strategy
    Stop {
        /// Strategy id (transaction reference)
        id: String,
    },

    /// Publish a saved strategy to the marketplace
    Publish {
        /// Strategy id
        id: String,
    },

    /// Subscribe to a published strategy by position in the feed
    Subscribe {
        /// Position in the marketplace feed (from `market`)
        index: usize,
    },

    /// Apply a simulated performance refresh to an active strategy
    Refresh {
        /// Strategy id
        id: String,
    },

    /// Delete a saved strategy by position
    Delete {
        /// Position in the saved collection (from `list`)
        index: usize,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    let store = Arc::new(JsonFileStore::new(&config.storage.data_dir));
    let chain = Arc::new(SimulatedChainClient::new(config.chain.clone()));
    let engine = LifecycleEngine::new(store, chain);

    match cli.command {
        Commands::Compose { text } => {
            let draft = composer::compose(&truncate_input(text, &config));
            print_strategy(&draft)?;
        }

        Commands::Save { text } => {
            let draft = composer::compose(&truncate_input(text, &config));
            let saved = engine.save(&draft)?;
            info!(
                id = saved.id.as_deref().unwrap_or(""),
                "saved to collection"
            );
            print_strategy(&saved)?;
        }

        Commands::List => {
            print_collection(&engine.saved_strategies());
        }

        Commands::Market => {
            print_collection(&engine.published_strategies());
        }

        Commands::Deploy { index } => {
            let strategy = strategy_at(&engine.saved_strategies(), index)?;
            engine.connect_wallet().await?;
            let deployed = engine.activate(&strategy).await?;
            print_strategy(&deployed)?;
        }

        Commands::Stop { id } => {
            engine.connect_wallet().await?;
            let tx_hash = engine.stop(&id).await?;
            info!(%tx_hash, "strategy stopped");
        }

        Commands::Publish { id } => {
            let published = engine.publish(&id)?;
            info!(
                subscribers = published.subscribers.unwrap_or(0),
                "published to marketplace"
            );
        }

        Commands::Subscribe { index } => {
            let published = strategy_at(&engine.published_strategies(), index)?;
            engine.connect_wallet().await?;
            let enrolled = engine.deploy(&engine.subscribe(&published)).await?;
            info!(
                id = enrolled.id.as_deref().unwrap_or(""),
                "subscribed as draft"
            );
        }

        Commands::Refresh { id } => {
            let sample = PerformanceSample::simulate(&mut rand::thread_rng());
            match engine.refresh_performance(&id, sample)? {
                Some(updated) => print_strategy(&updated)?,
                None => return Err(anyhow!("Strategy not found")),
            }
        }

        Commands::Delete { index } => {
            engine.delete(index)?;
        }
    }

    Ok(())
}

/// The UI caps input length; the composer itself accepts anything
fn truncate_input(text: String, config: &EngineConfig) -> String {
    let max = config.input.max_input_chars;
    if text.chars().count() <= max {
        return text;
    }
    text.chars().take(max).collect()
}

fn strategy_at(collection: &[StrategyResult], index: usize) -> Result<StrategyResult> {
    collection
        .get(index)
        .cloned()
        .ok_or_else(|| anyhow!("no strategy at position {index} (collection has {})", collection.len()))
}

fn print_strategy(strategy: &StrategyResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(strategy)?);
    Ok(())
}

fn print_collection(collection: &[StrategyResult]) {
    if collection.is_empty() {
        println!("(empty)");
        return;
    }
    for (i, s) in collection.iter().enumerate() {
        println!(
            "{:>3}  {:<28} {:<10} {:<10} {}",
            i,
            s.parameters.strategy_name,
            s.parameters.pair,
            format!("{:?}", s.status_or_draft()).to_lowercase(),
            s.id.as_deref().unwrap_or("-"),
        );
    }
}
