//! Card Strike CLI - Headless battles, simulations and drafts
//!
//! Commands:
//! - battle: Play one CPU battle and print its log
//! - simulate: Play many seeded battles in parallel and report win rates
//! - draft: Run the card draft with the greedy policy on both sides

mod battle_cmd;
mod draft_cmd;
mod setup;
mod simulate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardstrike")]
#[command(about = "Card Strike tactical combat engine")]
struct Cli {
    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single battle
    Battle(battle_cmd::BattleArgs),
    /// Play many battles and report statistics
    Simulate(simulate::SimulateArgs),
    /// Run the pre-battle card draft
    Draft(draft_cmd::DraftArgs),
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Battle(args) => battle_cmd::run(args, cli.seed),
        Commands::Simulate(args) => simulate::run(args, cli.seed),
        Commands::Draft(args) => draft_cmd::run(args, cli.seed),
    }
}
