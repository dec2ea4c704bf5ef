//! Minimax AI with alpha-beta pruning over board snapshots

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::combat::roll_jitter;
use crate::config::{JitterMode, RulesConfig, SearchConfig};
use crate::error::SearchError;
use crate::eval::{evaluate, EvalWeights};
use crate::snapshot::{Action, Snapshot};
use crate::unit::Owner;

/// Seed used when the configuration does not name one
const DEFAULT_SEED: u64 = 42;

/// Counters collected during one search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes visited, root included
    pub nodes: usize,
    /// Branches abandoned by alpha-beta
    pub cutoffs: usize,
}

/// Result of a root search
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    /// None when the side to act has no legal action
    pub action: Option<Action>,
    pub score: f32,
    pub stats: SearchStats,
}

// ============================================================================
// MINIMAX AI
// ============================================================================

/// Depth-limited minimax player for one side
pub struct MinimaxAI {
    pub search: SearchConfig,
    pub weights: EvalWeights,
    pub rules: RulesConfig,
    /// Maximizing side
    pub side: Owner,
    rng: ChaCha8Rng,
}

impl MinimaxAI {
    /// CPU-side AI
    pub fn new(search: SearchConfig, weights: EvalWeights, rules: RulesConfig) -> Self {
        let seed = search.seed.unwrap_or(DEFAULT_SEED);
        Self {
            search,
            weights,
            rules,
            side: Owner::Enemy,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn for_side(mut self, side: Owner) -> Self {
        self.side = side;
        self
    }

    /// Search the current position
    pub fn search(&mut self, board: &Board) -> Result<SearchOutcome, SearchError> {
        let root = Snapshot::from_board(board);
        let mut search = Search {
            config: &self.search,
            weights: &self.weights,
            rules: &self.rules,
            side: self.side,
            rng: &mut self.rng,
            stats: SearchStats::default(),
        };

        let (score, action) =
            search.minimax(&root, self.search.depth, f32::NEG_INFINITY, f32::INFINITY, true)?;
        let stats = search.stats;

        match action {
            Some(action) => debug!(
                ?action,
                score,
                nodes = stats.nodes,
                cutoffs = stats.cutoffs,
                "minimax decision"
            ),
            None => debug!(side = ?self.side, "minimax found no legal action"),
        }

        Ok(SearchOutcome { action, score, stats })
    }

    /// Best action for the current position
    pub fn best_action(&mut self, board: &Board) -> Result<Option<Action>, SearchError> {
        Ok(self.search(board)?.action)
    }

    /// Static evaluation of a position
    pub fn evaluate(&self, board: &Board) -> f32 {
        evaluate(&Snapshot::from_board(board), &self.weights, self.side)
    }
}

// ============================================================================
// SEARCH
// ============================================================================

struct Search<'a> {
    config: &'a SearchConfig,
    weights: &'a EvalWeights,
    rules: &'a RulesConfig,
    side: Owner,
    rng: &'a mut ChaCha8Rng,
    stats: SearchStats,
}

impl Search<'_> {
    fn budget_exhausted(&self) -> bool {
        self.config.max_nodes.is_some_and(|max| self.stats.nodes > max)
    }

    fn jitter(&mut self) -> i32 {
        match self.config.jitter_mode {
            JitterMode::Expected => 0,
            JitterMode::Sampled => roll_jitter(&mut *self.rng, self.rules.jitter),
        }
    }

    /// Score of `state` and the first action reaching it
    fn minimax(
        &mut self,
        state: &Snapshot,
        depth: u32,
        mut alpha: f32,
        mut beta: f32,
        maximizing: bool,
    ) -> Result<(f32, Option<Action>), SearchError> {
        self.stats.nodes += 1;

        // The root always expands so a budget never leaves us without an action
        let at_root = self.stats.nodes == 1;
        if depth == 0 || state.is_terminal() || (!at_root && self.budget_exhausted()) {
            return Ok((evaluate(state, self.weights, self.side), None));
        }

        let to_act = if maximizing { self.side } else { self.side.opponent() };
        let actions = state.generate_actions(to_act);
        if actions.is_empty() {
            return Ok((evaluate(state, self.weights, self.side), None));
        }

        let mut best_action = None;
        let mut best = if maximizing { f32::NEG_INFINITY } else { f32::INFINITY };

        for (i, action) in actions.iter().enumerate() {
            let mut child = state.clone();
            let jitter = self.jitter();
            child.apply(*action, jitter, self.rules.direct_cap_fraction)?;
            let (score, _) = self.minimax(&child, depth - 1, alpha, beta, !maximizing)?;

            if maximizing {
                if score > best || best_action.is_none() {
                    best = score;
                    best_action = Some(*action);
                }
                alpha = alpha.max(score);
            } else {
                if score < best || best_action.is_none() {
                    best = score;
                    best_action = Some(*action);
                }
                beta = beta.min(score);
            }

            if self.config.prune && beta <= alpha {
                if i + 1 < actions.len() {
                    self.stats.cutoffs += 1;
                }
                break;
            }
        }

        Ok((best, best_action))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Pos;
    use crate::unit::{Attack, Element, Unit};

    fn beast(owner: Owner, hp: i32, attacks: Vec<Attack>) -> Unit {
        Unit::new(owner, "beast", 40, attacks, 2, Element::Null).with_hp(hp)
    }

    fn strike(range: i32) -> Attack {
        Attack::new("Strike", 12, Element::Null, range)
    }

    fn ai(depth: u32) -> MinimaxAI {
        let search = SearchConfig { depth, ..SearchConfig::default() };
        MinimaxAI::new(search, EvalWeights::default(), RulesConfig::default())
    }

    fn lethal_board() -> Board {
        let mut board = Board::new(10, 6);
        board.place(Pos::new(2, 2), beast(Owner::Enemy, 40, vec![strike(3)])).unwrap();
        board.place(Pos::new(4, 2), beast(Owner::Player, 5, vec![strike(3)])).unwrap();
        board.place(Pos::new(8, 5), beast(Owner::Player, 40, vec![strike(1)])).unwrap();
        board
    }

    #[test]
    fn test_selects_lethal_attack() {
        let board = lethal_board();
        let outcome = ai(2).search(&board).unwrap();
        assert_eq!(
            outcome.action,
            Some(Action::Attack { from: Pos::new(2, 2), target: Pos::new(4, 2), attack: 0 })
        );
        assert!(outcome.stats.nodes > 1);
    }

    #[test]
    fn test_pruning_preserves_score() {
        let board = lethal_board();
        for depth in 1..=3 {
            let pruned = ai(depth).search(&board).unwrap();
            let mut exhaustive = ai(depth);
            exhaustive.search.prune = false;
            let full = exhaustive.search(&board).unwrap();

            assert_eq!(pruned.score, full.score, "depth {depth}");
            assert!(pruned.stats.nodes <= full.stats.nodes);
            assert_eq!(full.stats.cutoffs, 0);
        }
    }

    #[test]
    fn test_no_action_without_opponents() {
        let mut board = Board::new(5, 5);
        board.place(Pos::new(0, 0), beast(Owner::Enemy, 40, vec![strike(3)])).unwrap();
        assert_eq!(ai(2).best_action(&board).unwrap(), None);
    }

    #[test]
    fn test_node_budget_still_returns_action() {
        let board = lethal_board();
        let mut limited = ai(3);
        limited.search.max_nodes = Some(5);
        let outcome = limited.search(&board).unwrap();
        assert!(outcome.action.is_some());
        assert!(outcome.stats.nodes < ai(3).search(&board).unwrap().stats.nodes);
    }

    #[test]
    fn test_expected_jitter_is_reproducible() {
        let board = lethal_board();
        let a = ai(2).search(&board).unwrap();
        let b = MinimaxAI::new(
            SearchConfig { seed: Some(7), ..SearchConfig::default() },
            EvalWeights::default(),
            RulesConfig::default(),
        )
        .search(&board)
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_player_side_search() {
        let mut board = Board::new(10, 6);
        board.place(Pos::new(2, 2), beast(Owner::Player, 40, vec![strike(3)])).unwrap();
        board.place(Pos::new(3, 2), beast(Owner::Enemy, 5, vec![strike(3)])).unwrap();
        let mut player_ai = ai(2).for_side(Owner::Player);
        assert_eq!(
            player_ai.best_action(&board).unwrap(),
            Some(Action::Attack { from: Pos::new(2, 2), target: Pos::new(3, 2), attack: 0 })
        );
    }
}
