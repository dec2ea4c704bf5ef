//! Simulate command - play many seeded battles in parallel
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_battles(), report_results()
//! - Level 3: play_single_battle(), compute_statistics()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;
use tracing::info;

use cardstrike_core::{BattleConfig, BattleStatus, CardPool, Owner};

use crate::setup::{build_deck, create_rng, load_config, load_pool, new_battle};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SimulateArgs {
    /// Battle configuration JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Card pool JSON file (built-in pool when omitted)
    #[arg(long, value_name = "FILE")]
    pub pool: Option<PathBuf>,

    /// Player deck: element or card names, comma separated
    #[arg(long, value_delimiter = ',', default_value = "fire,water,leaf")]
    pub player: Vec<String>,

    /// CPU deck (a fresh random beast deck per battle when omitted)
    #[arg(long, value_delimiter = ',')]
    pub cpu: Vec<String>,

    /// Number of battles to play
    #[arg(long, default_value = "20")]
    pub games: usize,

    /// Minimax search depth (overrides the config)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Maximum rounds per battle
    #[arg(long, default_value = "100")]
    pub max_turns: u32,

    /// Let minimax play the player side instead of the greedy selectors
    #[arg(long)]
    pub search_player: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single battle
#[derive(Clone, Debug)]
struct BattleRecord {
    game_number: usize,
    seed: u64,
    status: BattleStatus,
    turns: u32,
    player_units: usize,
    enemy_units: usize,
}

/// Aggregated simulation results
#[derive(Clone, Debug)]
struct SimulationResults {
    battles: Vec<BattleRecord>,
    victories: usize,
    defeats: usize,
    draws: usize,
    avg_turns: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run the simulate command
pub fn run(args: SimulateArgs, seed: Option<u64>) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.depth, None)?;
    let pool = load_pool(args.pool.as_deref())?;
    let base_seed = seed.or(config.seed).unwrap_or(42);

    info!(
        games = args.games,
        depth = config.search.depth,
        base_seed,
        "Starting simulation"
    );

    let battles = play_battles(&args, &config, &pool, base_seed)?;
    let results = compute_statistics(battles);
    report_results(&results, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn play_battles(args: &SimulateArgs, config: &BattleConfig, pool: &CardPool, base_seed: u64) -> Result<Vec<BattleRecord>> {
    (0..args.games)
        .into_par_iter()
        .map(|game_index| {
            let seed = base_seed.wrapping_add(game_index as u64);
            play_single_battle(args, config.clone().with_seed(seed), pool, game_index + 1, seed)
        })
        .collect()
}

fn report_results(results: &SimulationResults, json: bool) -> Result<()> {
    if json {
        print_json_results(results)
    } else {
        print_text_results(results);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn play_single_battle(
    args: &SimulateArgs,
    config: BattleConfig,
    pool: &CardPool,
    game_number: usize,
    seed: u64,
) -> Result<BattleRecord> {
    let mut rng = create_rng(Some(seed));
    let player = build_deck(&args.player, Owner::Player, pool, &mut rng)?;
    let cpu = build_deck(&args.cpu, Owner::Enemy, pool, &mut rng)?;

    let mut battle = new_battle(config, player, cpu, args.search_player)?;
    let report = battle.run(args.max_turns);

    Ok(BattleRecord {
        game_number,
        seed,
        status: report.status,
        turns: report.turns,
        player_units: report.player_units,
        enemy_units: report.enemy_units,
    })
}

fn compute_statistics(mut battles: Vec<BattleRecord>) -> SimulationResults {
    battles.sort_by_key(|b| b.game_number);

    let count = |status: BattleStatus| battles.iter().filter(|b| b.status == status).count();
    let victories = count(BattleStatus::Victory);
    let defeats = count(BattleStatus::Defeat);
    let draws = count(BattleStatus::Ongoing);

    let avg_turns = if battles.is_empty() {
        0.0
    } else {
        battles.iter().map(|b| b.turns as f32).sum::<f32>() / battles.len() as f32
    };

    SimulationResults { battles, victories, defeats, draws, avg_turns }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn percent(part: usize, total: usize) -> f32 {
    if total > 0 {
        part as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

fn print_json_results(results: &SimulationResults) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonBattle {
        game: usize,
        seed: u64,
        status: BattleStatus,
        turns: u32,
        player_units: usize,
        enemy_units: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonResults {
        total_games: usize,
        victories: usize,
        defeats: usize,
        draws: usize,
        win_rate: f32,
        avg_turns: f32,
        battles: Vec<JsonBattle>,
    }

    let total = results.battles.len();
    let output = JsonResults {
        total_games: total,
        victories: results.victories,
        defeats: results.defeats,
        draws: results.draws,
        win_rate: percent(results.victories, total) / 100.0,
        avg_turns: results.avg_turns,
        battles: results
            .battles
            .iter()
            .map(|b| JsonBattle {
                game: b.game_number,
                seed: b.seed,
                status: b.status,
                turns: b.turns,
                player_units: b.player_units,
                enemy_units: b.enemy_units,
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_results(results: &SimulationResults) {
    let total = results.battles.len();

    println!("\n=== Simulation Results ===");
    println!("Total battles: {}", total);
    println!("Victories:     {} ({:.1}%)", results.victories, percent(results.victories, total));
    println!("Defeats:       {} ({:.1}%)", results.defeats, percent(results.defeats, total));
    println!("Draws:         {} ({:.1}%)", results.draws, percent(results.draws, total));
    println!("Avg rounds:    {:.1}", results.avg_turns);

    println!("\nBattle details:");
    for b in &results.battles {
        println!(
            "  Battle {} (seed {}): {:?} in {} rounds, {} vs {} units left",
            b.game_number, b.seed, b.status, b.turns, b.player_units, b.enemy_units
        );
    }
}
