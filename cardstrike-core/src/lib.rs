//! Card Strike Core - Combat rules and AI
//!
//! This crate provides the core of the Card Strike tactics game:
//! - Board geometry (square grid, bounded reachability)
//! - Units, attacks and the card roster
//! - Combat resolution with delayed effects
//! - Greedy selectors and minimax search with alpha-beta pruning
//! - Battle driver and the pre-battle card draft

pub mod board;
pub mod unit;
pub mod combat;
pub mod effects;
pub mod snapshot;
pub mod eval;
pub mod greedy;
pub mod ai;
pub mod battle;
pub mod roster;
pub mod draft;
pub mod config;
pub mod error;

// Re-exports for convenient access
pub use board::{Board, Pos, GRID_COLS, GRID_ROWS};
pub use unit::{Attack, AttackEffect, Element, Owner, Rarity, Unit, UnitId};
pub use combat::{resolve_attack, hit_damage, ActionKind, Hit, ResolvedEvent};
pub use effects::{EffectEvent, EffectLedger, FlameTile, OverTime};
pub use snapshot::{Action, Snapshot, UnitRecord};
pub use eval::{evaluate, EvalWeights};
pub use greedy::fallback_action;
pub use ai::{MinimaxAI, SearchOutcome, SearchStats};
pub use battle::{Battle, BattleEvent, BattleReport, BattleStatus};
pub use roster::{CardDef, CardPool};
pub use draft::{DraftMove, DraftState};
pub use config::{BattleConfig, HeuristicConfig, JitterMode, RulesConfig, SearchConfig};
pub use error::{BoardError, DraftError, SearchError};
