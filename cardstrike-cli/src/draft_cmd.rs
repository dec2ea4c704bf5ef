//! Draft command - deal two hands and draft them greedily
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_draft(), report_draft(), battle_decks()
//! - Level 3: describe_move()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cardstrike_core::draft::deck_score;
use cardstrike_core::{DraftMove, DraftState, Owner, Unit};

use crate::battle_cmd::{describe_event, outcome_label};
use crate::setup::{create_rng, load_config, load_pool, new_battle};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct DraftArgs {
    /// Card pool JSON file (built-in pool when omitted)
    #[arg(long, value_name = "FILE")]
    pub pool: Option<PathBuf>,

    /// Battle the drafted decks afterwards
    #[arg(long)]
    pub battle: bool,

    /// Battle configuration JSON file (with --battle)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Minimax search depth (with --battle)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Maximum battle rounds (with --battle)
    #[arg(long, default_value = "100")]
    pub max_turns: u32,

    /// Output the draft as JSON
    #[arg(long)]
    pub json: bool,
}

/// Finished draft
struct DraftOutcome {
    state: DraftState,
    moves: Vec<(Owner, DraftMove)>,
    player_deck: Vec<Unit>,
    cpu_deck: Vec<Unit>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run the draft command
pub fn run(args: DraftArgs, seed: Option<u64>) -> Result<()> {
    let outcome = run_draft(&args, seed)?;
    report_draft(&outcome, args.json)?;

    if args.battle {
        battle_decks(&args, seed, outcome)?;
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn run_draft(args: &DraftArgs, seed: Option<u64>) -> Result<DraftOutcome> {
    let pool = load_pool(args.pool.as_deref())?;
    let mut rng = create_rng(seed);

    let mut state = DraftState::deal(&pool, &mut rng).context("Failed to deal draft hands")?;
    let moves = state.run_greedy();
    let (player_deck, cpu_deck) = state.final_decks();

    info!(
        decisions = moves.len(),
        complete = state.is_complete(),
        player_score = deck_score(&player_deck),
        cpu_score = deck_score(&cpu_deck),
        "Draft finished"
    );

    Ok(DraftOutcome { state, moves, player_deck, cpu_deck })
}

fn report_draft(outcome: &DraftOutcome, json: bool) -> Result<()> {
    if json {
        return print_json_draft(outcome);
    }

    println!("\n=== Draft Log ===");
    for (turn, (side, mv)) in outcome.moves.iter().enumerate() {
        println!("  {:>2}. {}", turn + 1, describe_move(*side, *mv));
    }

    println!("\n=== Final Decks ===");
    print_deck("Player", &outcome.player_deck);
    print_deck("CPU", &outcome.cpu_deck);
    if !outcome.state.is_complete() {
        println!("\nDraft stopped before both decks were full");
    }
    Ok(())
}

fn battle_decks(args: &DraftArgs, seed: Option<u64>, outcome: DraftOutcome) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.depth, seed)?;
    let mut battle = new_battle(config, outcome.player_deck, outcome.cpu_deck, false)?;
    let report = battle.run(args.max_turns);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n=== Battle Log ===");
    for event in &report.events {
        println!("  {}", describe_event(event));
    }
    println!("\nOutcome: {} after {} rounds", outcome_label(&report), report.turns);
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn describe_move(side: Owner, mv: DraftMove) -> String {
    let who = match side {
        Owner::Player => "Player",
        Owner::Enemy => "CPU",
    };
    match mv {
        DraftMove::Retain(i) => format!("{} keeps hand card {}", who, i),
        DraftMove::Steal(i) => format!("{} steals opponent card {}", who, i),
        DraftMove::Swap { steal, discard } => {
            format!("{} swaps deck card {} for opponent card {}", who, discard, steal)
        }
        DraftMove::Pass => format!("{} passes", who),
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn print_deck(label: &str, deck: &[Unit]) {
    println!("{} (score {:.1}):", label, deck_score(deck));
    for unit in deck {
        println!(
            "  {:<16} {:>3} hp  {:<8} {:?}",
            unit.name,
            unit.max_hp,
            unit.element.name(),
            unit.rarity
        );
    }
}

fn print_json_draft(outcome: &DraftOutcome) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonCard {
        name: String,
        hp: i32,
        element: &'static str,
    }

    #[derive(serde::Serialize)]
    struct JsonDraft {
        complete: bool,
        moves: Vec<(Owner, DraftMove)>,
        player_deck: Vec<JsonCard>,
        player_score: f32,
        cpu_deck: Vec<JsonCard>,
        cpu_score: f32,
    }

    let cards = |deck: &[Unit]| {
        deck.iter()
            .map(|u| JsonCard { name: u.name.clone(), hp: u.max_hp, element: u.element.name() })
            .collect()
    };

    let output = JsonDraft {
        complete: outcome.state.is_complete(),
        moves: outcome.moves.clone(),
        player_deck: cards(&outcome.player_deck),
        player_score: deck_score(&outcome.player_deck),
        cpu_deck: cards(&outcome.cpu_deck),
        cpu_score: deck_score(&outcome.cpu_deck),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_move() {
        assert_eq!(describe_move(Owner::Player, DraftMove::Retain(2)), "Player keeps hand card 2");
        assert_eq!(
            describe_move(Owner::Enemy, DraftMove::Swap { steal: 1, discard: 0 }),
            "CPU swaps deck card 0 for opponent card 1"
        );
        assert_eq!(describe_move(Owner::Enemy, DraftMove::Pass), "CPU passes");
    }

    #[test]
    fn test_seeded_draft_fills_decks() {
        let args = DraftArgs {
            pool: None,
            battle: false,
            config: None,
            depth: None,
            max_turns: 10,
            json: false,
        };
        let a = run_draft(&args, Some(9)).unwrap();
        let b = run_draft(&args, Some(9)).unwrap();

        assert!(a.state.is_complete());
        assert_eq!(a.player_deck.len(), 3);
        assert_eq!(a.cpu_deck.len(), 3);
        assert_eq!(a.moves, b.moves);
    }
}
