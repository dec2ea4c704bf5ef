//! Battle driver: owns the board, the effect ledger and the AI
//!
//! A round is one player action, one CPU action, then one ledger tick.
//! Decisions are taken first and applied afterwards (`decide` then
//! `apply`), so the live board is never touched while a search runs.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::MinimaxAI;
use crate::board::{Board, Pos};
use crate::combat::{resolve_attack, ResolvedEvent};
use crate::config::{BattleConfig, HeuristicConfig};
use crate::effects::{EffectEvent, EffectLedger};
use crate::error::{BoardError, SearchError};
use crate::greedy::fallback_action;
use crate::snapshot::Action;
use crate::unit::{Attack, Owner, Unit, UnitId};

/// Outcome from the player's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleStatus {
    Ongoing,
    Victory,
    Defeat,
}

/// Entry of a battle log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    Action {
        turn: u32,
        side: Owner,
        action: Action,
        /// None when the rules engine rejected the action
        resolved: Option<ResolvedEvent>,
    },
    Effect {
        turn: u32,
        effect: EffectEvent,
    },
}

/// Summary of a finished (or turn-limited) battle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleReport {
    pub status: BattleStatus,
    pub turns: u32,
    pub player_units: usize,
    pub enemy_units: usize,
    pub events: Vec<BattleEvent>,
}

// ============================================================================
// BATTLE
// ============================================================================

pub struct Battle {
    board: Board,
    ledger: EffectLedger,
    config: BattleConfig,
    cpu: MinimaxAI,
    /// Search for the player side; the greedy selectors play it when None
    player_ai: Option<MinimaxAI>,
    rng: ChaCha8Rng,
    turn: u32,
}

impl Battle {
    pub fn new(config: BattleConfig) -> Self {
        let board = Board::new(config.cols, config.rows);
        Self::with_board(board, config)
    }

    /// Battle over an already populated board
    pub fn with_board(board: Board, config: BattleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let cpu = MinimaxAI::new(config.search.clone(), config.weights.clone(), config.rules.clone());
        Self {
            board,
            ledger: EffectLedger::new(),
            config,
            cpu,
            player_ai: None,
            rng,
            turn: 1,
        }
    }

    /// Let minimax play the player side as well
    pub fn with_player_search(mut self) -> Self {
        let search = self.config.search.clone();
        let ai = MinimaxAI::new(search, self.config.weights.clone(), self.config.rules.clone());
        self.player_ai = Some(ai.for_side(Owner::Player));
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn ledger(&self) -> &EffectLedger {
        &self.ledger
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn place(&mut self, pos: Pos, unit: Unit) -> Result<UnitId, BoardError> {
        self.board.place(pos, unit)
    }

    /// Drop a deck onto random empty cells of its half of the board
    pub fn place_deck(&mut self, units: Vec<Unit>) -> Result<Vec<Pos>, BoardError> {
        let cols = self.board.cols();
        let half = cols / 2;
        let mut placed = Vec::with_capacity(units.len());
        for unit in units {
            let owner = unit.owner;
            let in_zone = |p: &Pos| match owner {
                Owner::Player => p.col < half,
                Owner::Enemy => p.col >= cols - half,
            };
            let mut cells: Vec<Pos> = self.board.empty_cells().into_iter().filter(in_zone).collect();
            if cells.is_empty() {
                cells = self.board.empty_cells();
            }
            let pos = *cells.choose(&mut self.rng).ok_or(BoardError::NoFreeCell)?;
            self.board.place(pos, unit)?;
            placed.push(pos);
        }
        Ok(placed)
    }

    /// Victory once the CPU side is wiped out, defeat once the player side is
    pub fn status(&self) -> BattleStatus {
        if self.board.count(Owner::Enemy) == 0 {
            BattleStatus::Victory
        } else if self.board.count(Owner::Player) == 0 {
            BattleStatus::Defeat
        } else {
            BattleStatus::Ongoing
        }
    }

    // ========================================================================
    // DECISIONS
    // ========================================================================

    /// Choose an action for `side` without touching the board.
    ///
    /// Search faults and empty searches fall back to the greedy selectors.
    pub fn decide(&mut self, side: Owner) -> Option<Action> {
        let ai = if side == self.cpu.side {
            Some(&mut self.cpu)
        } else {
            self.player_ai.as_mut().filter(|ai| ai.side == side)
        };

        let searched = match ai {
            Some(ai) => ai.best_action(&self.board),
            None => Ok(None),
        };
        settle_decision(searched, &self.board, side, &self.config.heuristics)
    }

    /// Apply a decided action through the rules engine
    pub fn apply(&mut self, action: Action) -> Option<ResolvedEvent> {
        match action {
            Action::Attack { from, target, attack } => {
                let attack = self.board.occupant(from)?.attacks.get(attack)?.clone();
                self.apply_attack(from, target, &attack)
            }
            Action::Move { from, to } => self.apply_move(from, to),
        }
    }

    /// Single entry point for a CPU turn
    pub fn decide_and_apply(&mut self) -> Option<ResolvedEvent> {
        let side = self.cpu.side;
        let action = self.decide(side)?;
        let resolved = self.apply(action);
        debug!(turn = self.turn, ?side, ?action, ?resolved, "cpu action");
        resolved
    }

    /// Resolve a confirmed attack
    pub fn apply_attack(&mut self, attacker_pos: Pos, target_pos: Pos, attack: &Attack) -> Option<ResolvedEvent> {
        resolve_attack(
            &mut self.board,
            &mut self.ledger,
            &self.config.rules,
            attacker_pos,
            target_pos,
            attack,
            &mut self.rng,
        )
    }

    /// Move a unit to an empty cell it can reach this turn
    pub fn apply_move(&mut self, from: Pos, to: Pos) -> Option<ResolvedEvent> {
        let unit = self.board.occupant(from)?;
        if to == from || !self.board.is_empty(to) || !self.board.reachable(from, unit.move_range).contains(&to) {
            return None;
        }
        self.board
            .move_unit(from, to)
            .then(|| ResolvedEvent::movement(from, to))
    }

    /// Tick delayed effects and advance the turn counter
    pub fn end_turn(&mut self) -> Vec<EffectEvent> {
        let effects = self.ledger.tick(&mut self.board);
        for effect in &effects {
            debug!(turn = self.turn, ?effect, "effect tick");
        }
        self.turn += 1;
        effects
    }

    // ========================================================================
    // HEADLESS PLAY
    // ========================================================================

    /// Play rounds until one side is gone, nothing happens any more, or
    /// `max_turns` rounds have been played
    pub fn run(&mut self, max_turns: u32) -> BattleReport {
        let mut events = Vec::new();
        let start = self.turn;

        while self.status() == BattleStatus::Ongoing && self.turn - start < max_turns {
            let mut acted = false;

            for side in [Owner::Player, Owner::Enemy] {
                if self.status() != BattleStatus::Ongoing {
                    break;
                }
                let Some(action) = self.decide(side) else {
                    continue;
                };
                let resolved = self.apply(action);
                debug!(turn = self.turn, ?side, ?action, ?resolved, "action");
                acted |= resolved.is_some();
                events.push(BattleEvent::Action { turn: self.turn, side, action, resolved });
            }

            let turn = self.turn;
            let effects = self.end_turn();
            let ticked = !effects.is_empty();
            events.extend(effects.into_iter().map(|effect| BattleEvent::Effect { turn, effect }));

            if !acted && !ticked && self.ledger.is_empty() {
                debug!(turn, "no side can act, stopping");
                break;
            }
        }

        let report = BattleReport {
            status: self.status(),
            turns: self.turn - start,
            player_units: self.board.count(Owner::Player),
            enemy_units: self.board.count(Owner::Enemy),
            events,
        };
        info!(
            status = ?report.status,
            turns = report.turns,
            player_units = report.player_units,
            enemy_units = report.enemy_units,
            "battle finished"
        );
        report
    }
}

/// Turn a search result into the action to play: faults are logged and,
/// like an empty search, replaced by the greedy selectors
fn settle_decision(
    searched: Result<Option<Action>, SearchError>,
    board: &Board,
    side: Owner,
    heuristics: &HeuristicConfig,
) -> Option<Action> {
    let searched = searched.unwrap_or_else(|err| {
        warn!(?side, error = %err, "search fault, using heuristic fallback");
        None
    });
    searched.or_else(|| fallback_action(board, side, heuristics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{enemy_card, player_card};
    use crate::unit::{AttackEffect, Element};

    fn unit(owner: Owner, hp: i32, attacks: Vec<Attack>) -> Unit {
        Unit::new(owner, "u", 40, attacks, 2, Element::Null).with_hp(hp)
    }

    fn small_config() -> BattleConfig {
        BattleConfig::default().with_board_size(8, 5).with_seed(11)
    }

    #[test]
    fn test_status() {
        let mut battle = Battle::new(small_config());
        battle.place(Pos::new(0, 0), unit(Owner::Player, 40, vec![Attack::new("Strike", 12, Element::Null, 4)])).unwrap();
        assert_eq!(battle.status(), BattleStatus::Victory);
        battle.place(Pos::new(7, 4), unit(Owner::Enemy, 40, vec![Attack::new("Strike", 12, Element::Null, 4)])).unwrap();
        assert_eq!(battle.status(), BattleStatus::Ongoing);
    }

    #[test]
    fn test_cpu_takes_lethal_shot() {
        let mut battle = Battle::new(small_config());
        battle.place(Pos::new(1, 1), unit(Owner::Enemy, 40, vec![Attack::new("Strike", 12, Element::Null, 3)])).unwrap();
        battle.place(Pos::new(1, 3), unit(Owner::Player, 4, vec![Attack::new("Strike", 12, Element::Null, 3)])).unwrap();

        let event = battle.decide_and_apply().unwrap();
        assert!(event.unit_died);
        assert_eq!(battle.status(), BattleStatus::Defeat);
    }

    #[test]
    fn test_apply_move_rules() {
        let mut battle = Battle::new(small_config());
        battle.place(Pos::new(0, 0), unit(Owner::Player, 40, vec![Attack::new("Strike", 12, Element::Null, 4)])).unwrap();
        battle.place(Pos::new(1, 0), unit(Owner::Enemy, 40, vec![Attack::new("Strike", 12, Element::Null, 4)])).unwrap();

        assert!(battle.apply_move(Pos::new(0, 0), Pos::new(1, 0)).is_none());
        assert!(battle.apply_move(Pos::new(0, 0), Pos::new(0, 3)).is_none());
        assert!(battle.apply_move(Pos::new(4, 4), Pos::new(4, 3)).is_none());

        let event = battle.apply_move(Pos::new(0, 0), Pos::new(0, 2)).unwrap();
        assert_eq!(event.target, Some(Pos::new(0, 2)));
        assert!(battle.board().is_empty(Pos::new(0, 0)));
    }

    #[test]
    fn test_zero_depth_falls_back_to_heuristics() {
        let config = small_config().with_depth(0);
        let mut battle = Battle::new(config);
        battle.place(Pos::new(0, 2), unit(Owner::Enemy, 40, vec![Attack::new("Strike", 12, Element::Null, 2)])).unwrap();
        battle.place(Pos::new(7, 2), unit(Owner::Player, 40, vec![Attack::new("Strike", 12, Element::Null, 2)])).unwrap();

        let action = battle.decide(Owner::Enemy).unwrap();
        assert!(matches!(action, Action::Move { from, .. } if from == Pos::new(0, 2)));
    }

    #[test]
    fn test_search_fault_falls_back_to_heuristics() {
        let mut battle = Battle::new(small_config());
        battle.place(Pos::new(0, 2), unit(Owner::Enemy, 40, vec![Attack::new("Strike", 12, Element::Null, 2)])).unwrap();
        battle.place(Pos::new(1, 2), unit(Owner::Player, 10, vec![Attack::new("Strike", 12, Element::Null, 2)])).unwrap();

        let fault = Err(SearchError::MissingUnit(Pos::new(4, 4)));
        let action = settle_decision(fault, battle.board(), Owner::Enemy, &battle.config().heuristics);
        let greedy = fallback_action(battle.board(), Owner::Enemy, &battle.config().heuristics);
        assert!(action.is_some());
        assert_eq!(action, greedy);
        assert!(matches!(action, Some(Action::Attack { target, .. }) if target == Pos::new(1, 2)));

        // A found action is kept as is
        let searched = Action::Move { from: Pos::new(0, 2), to: Pos::new(0, 3) };
        assert_eq!(
            settle_decision(Ok(Some(searched)), battle.board(), Owner::Enemy, &battle.config().heuristics),
            Some(searched)
        );
    }

    #[test]
    fn test_trail_then_tick() {
        let mut battle = Battle::new(BattleConfig::default().with_seed(3));
        let trail = Attack::new("Burning Trail", 12, Element::Fire, 5).with_effect(AttackEffect::Trail);
        battle.place(Pos::new(2, 2), unit(Owner::Enemy, 40, vec![trail.clone()])).unwrap();
        battle.place(Pos::new(3, 2), unit(Owner::Player, 40, vec![Attack::new("Strike", 12, Element::Null, 4)])).unwrap();

        let event = battle.apply_attack(Pos::new(2, 2), Pos::new(3, 2), &trail).unwrap();
        let after_hit = 40 - event.damage;
        let effects = battle.end_turn();
        assert_eq!(effects.len(), 1);
        assert_eq!(battle.board().occupant(Pos::new(3, 2)).unwrap().hp, after_hit - 5);
        assert_eq!(battle.turn(), 2);
    }

    #[test]
    fn test_place_deck_uses_halves() {
        let mut battle = Battle::new(BattleConfig::default().with_seed(9));
        let heroes = (0..3).map(|i| player_card(i, Element::Fire)).collect();
        let beasts = (0..3).map(|i| enemy_card(i, Element::Leaf)).collect();

        let left = battle.place_deck(heroes).unwrap();
        let right = battle.place_deck(beasts).unwrap();
        assert!(left.iter().all(|p| p.col < 11));
        assert!(right.iter().all(|p| p.col >= 12));
        assert_eq!(battle.board().units().len(), 6);
    }

    #[test]
    fn test_seeded_battles_are_reproducible() {
        let play = || {
            let mut battle = Battle::new(BattleConfig::default().with_board_size(10, 6).with_seed(21));
            battle.place_deck((0..2).map(|i| player_card(i, Element::Null)).collect()).unwrap();
            battle.place_deck((0..2).map(|i| enemy_card(i, Element::Fire)).collect()).unwrap();
            battle.run(200)
        };
        let a = play();
        let b = play();
        assert_eq!(a.status, b.status);
        assert_eq!(a.turns, b.turns);
        assert_eq!(a.events, b.events);
        assert!(a.turns <= 200);
    }
}
