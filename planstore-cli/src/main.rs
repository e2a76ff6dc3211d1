//! planstore scenario tool
//!
//! Usage:
//!   planstore inspect scenario.plan
//!   planstore upgrade old.plan new.plan
//!   planstore replay scenario.plan

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use planstore_cli::{Inspection, ReplaySummary};
use planstore_scenario::{ScenarioConfig, ScenarioStore};
use planstore_types::CancellationScopes;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "planstore")]
#[command(about = "Inspect, upgrade and replay planstore scenario files")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON scenario configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print version, entity counts, history size and transmission count
    Inspect { file: PathBuf },
    /// Rewrite a scenario at the current format version
    Upgrade { input: PathBuf, output: PathBuf },
    /// Re-apply the transmission log into a fresh scenario
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = match &args.config {
        Some(path) => ScenarioConfig::load(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    let store = ScenarioStore::new(config).context("Failed to build transmission factory")?;

    match &args.command {
        Command::Inspect { file } => {
            let inspection = planstore_cli::inspect(&store, file).await?;
            print_inspection(&inspection, args.json)?;
        }
        Command::Upgrade { input, output } => {
            let inspection = planstore_cli::upgrade(&store, input, output).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&inspection)?);
            } else {
                println!(
                    "Upgraded {} (v{}) -> {}",
                    input.display(),
                    inspection.format_version,
                    output.display()
                );
            }
        }
        Command::Replay { file } => {
            let scopes = CancellationScopes::new();
            let cancel = scopes.client.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping replay");
                    cancel.cancel();
                }
            });
            let summary = planstore_cli::replay(&store, file, &scopes.client).await?;
            print_replay(&summary, args.json)?;
        }
    }
    Ok(())
}

fn print_inspection(inspection: &Inspection, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(inspection)?);
        return Ok(());
    }
    println!("Scenario:       {} ({})", inspection.name, inspection.scenario_id);
    println!("Format version: {}", inspection.format_version);
    println!("Plants:         {}", inspection.plants);
    println!("Resources:      {}", inspection.resources);
    println!("Jobs:           {}", inspection.jobs);
    println!("Operations:     {}", inspection.operations);
    println!("History:        {}", inspection.history_records);
    println!("Transmissions:  {}", inspection.transmissions);
    println!("Last sequence:  {}", inspection.last_sequence);
    if inspection.dangling_references > 0 {
        println!("Dangling refs:  {}", inspection.dangling_references);
    }
    Ok(())
}

fn print_replay(summary: &ReplaySummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    info!("Replay finished at sequence {}", summary.last_sequence);
    println!("Applied {} transmissions", summary.applied);
    for (kind, set) in summary.changes.kinds() {
        println!(
            "  {kind}: {} added, {} updated, {} deleted",
            set.added.len(),
            set.updated.len(),
            set.deleted.len()
        );
    }
    Ok(())
}
