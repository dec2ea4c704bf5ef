//! Battle configuration: rules constants, search settings and AI tuning

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::{GRID_COLS, GRID_ROWS};
use crate::eval::EvalWeights;

/// Numeric constants of the combat rules
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Uniform damage jitter in `[-jitter, jitter]`
    pub jitter: i32,
    /// A direct hit never exceeds this fraction of the target's max hp
    pub direct_cap_fraction: f32,
    pub trail_length: i8,
    pub trail_damage: i32,
    pub trail_ticks: i32,
    pub cross_heal: i32,
    pub cross_burn: i32,
    pub fusion_heal: i32,
    pub fusion_burn: i32,
    pub support_ticks: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            jitter: 2,
            direct_cap_fraction: 0.25,
            trail_length: 5,
            trail_damage: 5,
            trail_ticks: 3,
            cross_heal: 5,
            cross_burn: 8,
            fusion_heal: 7,
            fusion_burn: 10,
            support_ticks: 2,
        }
    }
}

/// How simulated damage inside the search treats jitter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterMode {
    /// Zero jitter: reproducible search
    #[default]
    Expected,
    /// Draw jitter from the search RNG like real resolution does
    Sampled,
}

/// Minimax search settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies to look ahead (2 = CPU action, player response)
    pub depth: u32,
    /// Alpha-beta pruning; disabling it gives the exhaustive reference search
    pub prune: bool,
    pub jitter_mode: JitterMode,
    /// Node budget; past it nodes are evaluated statically
    pub max_nodes: Option<usize>,
    /// Seed for the search RNG (None = 42)
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            prune: true,
            jitter_mode: JitterMode::Expected,
            max_nodes: None,
            seed: None,
        }
    }
}

/// Tuning of the greedy selectors used for fallback decisions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Preferred distance to opponents for ranged units
    pub ideal_range: i32,
    /// Preferred distance for units whose longest attack is shorter than `ideal_range`
    pub melee_ideal_range: i32,
    pub edge_penalty: i32,
    /// Below this hp ratio a unit without a target retreats instead of advancing
    pub retreat_hp_ratio: f32,
    /// Allies below this hp ratio are worth a support cast
    pub heal_hp_ratio: f32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            ideal_range: 3,
            melee_ideal_range: 1,
            edge_penalty: 2,
            retreat_hp_ratio: 0.5,
            heal_hp_ratio: 0.5,
        }
    }
}

impl HeuristicConfig {
    /// Ideal engagement distance for a unit with the given longest attack
    pub fn ideal_range_for(&self, max_attack_range: Option<i32>) -> i32 {
        match max_attack_range {
            Some(range) if range < self.ideal_range => self.melee_ideal_range.min(range).max(1),
            _ => self.ideal_range,
        }
    }
}

/// Complete configuration of a battle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub cols: i8,
    pub rows: i8,
    pub rules: RulesConfig,
    pub search: SearchConfig,
    pub weights: EvalWeights,
    pub heuristics: HeuristicConfig,
    /// Seed for combat jitter and placement (None = entropy)
    pub seed: Option<u64>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            cols: GRID_COLS,
            rows: GRID_ROWS,
            rules: RulesConfig::default(),
            search: SearchConfig::default(),
            weights: EvalWeights::default(),
            heuristics: HeuristicConfig::default(),
            seed: None,
        }
    }
}

impl BattleConfig {
    /// Set search depth
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.search.depth = depth;
        self
    }

    /// Seed both the battle RNG and the search RNG
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.search.seed = Some(seed);
        self
    }

    pub fn with_board_size(mut self, cols: i8, rows: i8) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Exhaustive minimax, used to cross-check pruning
    pub fn without_pruning(mut self) -> Self {
        self.search.prune = false;
        self
    }

    /// Load from JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
