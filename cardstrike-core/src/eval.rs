//! Snapshot evaluation

use serde::{Deserialize, Serialize};

use crate::snapshot::{Snapshot, UnitRecord};
use crate::unit::{Owner, Rarity};

/// Default longest attack range for units with no attacks
const DEFAULT_THREAT_RANGE: i32 = 3;

/// Weights of the evaluation function
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    /// Unit value by rarity (normal, rare, epic, legendary)
    pub rarity_values: [f32; 4],
    pub max_hp_factor: f32,
    pub hp_ratio_factor: f32,
    pub attack_factor: f32,
    /// Per unit of head-count advantage
    pub kill_bonus: f32,
    /// Per maximizer/minimizer pair already within attack range
    pub in_range_bonus: f32,
    /// Per pair reachable within one move plus attack range
    pub reach_bonus: f32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            rarity_values: [1.0, 1.3, 1.6, 2.0],
            max_hp_factor: 0.5,
            hp_ratio_factor: 30.0,
            attack_factor: 0.3,
            kill_bonus: 50.0,
            in_range_bonus: 8.0,
            reach_bonus: 3.0,
        }
    }
}

impl EvalWeights {
    pub fn rarity_value(&self, rarity: Rarity) -> f32 {
        let index = match rarity {
            Rarity::Normal => 0,
            Rarity::Rare => 1,
            Rarity::Epic => 2,
            Rarity::Legendary => 3,
        };
        self.rarity_values[index]
    }

    /// Material worth of one unit
    pub fn unit_value(&self, unit: &UnitRecord) -> f32 {
        let value = self.rarity_value(unit.rarity);
        unit.max_hp as f32 * value * self.max_hp_factor
            + unit.hp_ratio() * value * self.hp_ratio_factor
            + unit.best_damage() as f32 * value * self.attack_factor
    }
}

/// Score a snapshot from `maximizer`'s point of view (higher is better for it)
pub fn evaluate(snapshot: &Snapshot, weights: &EvalWeights, maximizer: Owner) -> f32 {
    let minimizer = maximizer.opponent();

    let material = |side: Owner| -> f32 { snapshot.units_of(side).map(|u| weights.unit_value(u)).sum() };
    let mut score = material(maximizer) - material(minimizer);

    let head_count = snapshot.count(maximizer) as f32 - snapshot.count(minimizer) as f32;
    score += head_count * weights.kill_bonus;

    score + threat_bonus(snapshot, weights, maximizer)
}

/// Proximity pressure of the maximizer's units on the other side
fn threat_bonus(snapshot: &Snapshot, weights: &EvalWeights, maximizer: Owner) -> f32 {
    let mut bonus = 0.0;
    for hunter in snapshot.units_of(maximizer) {
        let range = hunter.max_attack_range().unwrap_or(DEFAULT_THREAT_RANGE);
        for prey in snapshot.units_of(maximizer.opponent()) {
            let dist = hunter.pos.distance_to(prey.pos);
            if dist <= range {
                bonus += weights.in_range_bonus;
            } else if dist <= range + hunter.move_range as i32 {
                bonus += weights.reach_bonus;
            }
        }
    }
    bonus
}
