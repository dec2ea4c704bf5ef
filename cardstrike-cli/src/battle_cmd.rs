//! Battle command - play one headless battle against the CPU
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: prepare_battle(), report_battle()
//! - Level 3: describe_event()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use cardstrike_core::{ActionKind, Battle, BattleEvent, BattleReport, BattleStatus, EffectEvent, Owner, Pos};

use crate::setup::{build_deck, create_rng, load_config, load_pool, new_battle};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BattleArgs {
    /// Battle configuration JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Card pool JSON file (built-in pool when omitted)
    #[arg(long, value_name = "FILE")]
    pub pool: Option<PathBuf>,

    /// Player deck: element or card names, comma separated
    #[arg(long, value_delimiter = ',', default_value = "fire,water,leaf")]
    pub player: Vec<String>,

    /// CPU deck: element or card names (random beasts when omitted)
    #[arg(long, value_delimiter = ',')]
    pub cpu: Vec<String>,

    /// Minimax search depth (overrides the config)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Maximum rounds before the battle is called a draw
    #[arg(long, default_value = "100")]
    pub max_turns: u32,

    /// Let minimax play the player side instead of the greedy selectors
    #[arg(long)]
    pub search_player: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run the battle command
pub fn run(args: BattleArgs, seed: Option<u64>) -> Result<()> {
    let mut battle = prepare_battle(&args, seed)?;

    info!(
        player_units = battle.board().count(Owner::Player),
        cpu_units = battle.board().count(Owner::Enemy),
        depth = battle.config().search.depth,
        "Starting battle"
    );

    let report = battle.run(args.max_turns);
    report_battle(&report, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn prepare_battle(args: &BattleArgs, seed: Option<u64>) -> Result<Battle> {
    let config = load_config(args.config.as_deref(), args.depth, seed)?;
    let pool = load_pool(args.pool.as_deref())?;
    let mut rng = create_rng(config.seed);

    let player = build_deck(&args.player, Owner::Player, &pool, &mut rng)?;
    let cpu = build_deck(&args.cpu, Owner::Enemy, &pool, &mut rng)?;
    new_battle(config, player, cpu, args.search_player)
}

fn report_battle(report: &BattleReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("\n=== Battle Log ===");
    for event in &report.events {
        println!("  {}", describe_event(event));
    }

    println!("\n=== Battle Result ===");
    println!("Outcome:      {}", outcome_label(report));
    println!("Rounds:       {}", report.turns);
    println!("Player units: {}", report.player_units);
    println!("CPU units:    {}", report.enemy_units);
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// One log line per battle event
pub fn describe_event(event: &BattleEvent) -> String {
    match event {
        BattleEvent::Action { turn, side, resolved: Some(r), .. } => match r.kind {
            ActionKind::Move => format!(
                "[{}] {} moves {} -> {}",
                turn,
                side_label(*side),
                pos_label(r.source),
                r.target.map(pos_label).unwrap_or_default()
            ),
            ActionKind::Attack => {
                let mut line = format!(
                    "[{}] {} attacks {} -> {} for {}",
                    turn,
                    side_label(*side),
                    pos_label(r.source),
                    r.target.map(pos_label).unwrap_or_default(),
                    r.damage
                );
                if r.absorbed > 0 {
                    line.push_str(&format!(" ({} absorbed)", r.absorbed));
                }
                if r.effects_registered > 0 {
                    line.push_str(&format!(", {} effects", r.effects_registered));
                }
                if r.unit_died {
                    line.push_str(", target defeated");
                }
                line
            }
        },
        BattleEvent::Action { turn, side, action, resolved: None } => {
            format!("[{}] {} {:?} rejected", turn, side_label(*side), action)
        }
        BattleEvent::Effect { turn, effect } => match effect {
            EffectEvent::Flame { pos, damage, died, .. } => {
                format!("[{}] flame burns {} for {}{}", turn, pos_label(*pos), damage, died_suffix(*died))
            }
            EffectEvent::Burn { pos, damage, died, .. } => {
                format!("[{}] burn hits {} for {}{}", turn, pos_label(*pos), damage, died_suffix(*died))
            }
            EffectEvent::Regen { pos, healed, .. } => {
                format!("[{}] regen heals {} for {}", turn, pos_label(*pos), healed)
            }
        },
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

pub fn outcome_label(report: &BattleReport) -> &'static str {
    match report.status {
        BattleStatus::Victory => "Victory",
        BattleStatus::Defeat => "Defeat",
        BattleStatus::Ongoing => "Draw (turn limit)",
    }
}

fn side_label(side: Owner) -> &'static str {
    match side {
        Owner::Player => "Player",
        Owner::Enemy => "CPU",
    }
}

fn pos_label(pos: Pos) -> String {
    format!("({},{})", pos.col, pos.row)
}

fn died_suffix(died: bool) -> &'static str {
    if died {
        ", unit defeated"
    } else {
        ""
    }
}
