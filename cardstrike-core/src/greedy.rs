//! Greedy move and target selectors
//!
//! Pure functions over the live board used when the search has nothing to
//! offer, and by the heuristic opponent in simulations. Each one is
//! deterministic: candidates are scanned in position order and the first
//! best candidate wins.

use crate::board::{sorted, Board, Pos};
use crate::config::HeuristicConfig;
use crate::snapshot::Action;
use crate::unit::{AttackEffect, Element, Owner, Unit};

/// Bonus added to fire attacks when picking by element
const FIRE_BONUS: i32 = 2;

/// Opponent to focus: in range first, then lowest hp ratio, then nearest
pub fn best_target(board: &Board, from: Pos, unit: &Unit) -> Option<Pos> {
    board
        .units_of(unit.owner.opponent())
        .into_iter()
        .map(|(pos, target)| {
            let distance = from.distance_to(pos);
            let in_range = unit.offensive_attacks().any(|(_, a)| a.covers(distance));
            (pos, !in_range, target.hp_ratio(), distance)
        })
        .min_by(|a, b| {
            a.1.cmp(&b.1)
                .then(a.2.total_cmp(&b.2))
                .then(a.3.cmp(&b.3))
        })
        .map(|(pos, ..)| pos)
}

/// Offensive attack covering `distance` with the highest damage, fire favoured
pub fn element_attack_pick(unit: &Unit, distance: i32) -> Option<usize> {
    let score = |dmg: i32, element: Element| dmg + if element == Element::Fire { FIRE_BONUS } else { 0 };

    let mut best: Option<(usize, i32)> = None;
    for (index, attack) in unit.offensive_attacks() {
        if !attack.covers(distance) {
            continue;
        }
        let s = score(attack.dmg, attack.element);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((index, s));
        }
    }
    best.map(|(index, _)| index)
}

/// Reachable cell closest to the unit's ideal engagement distance.
///
/// Minimises the summed gap to every opponent plus an edge penalty; staying
/// put wins ties.
pub fn nearest_approach_move(
    board: &Board,
    from: Pos,
    unit: &Unit,
    opponents: &[Pos],
    heuristics: &HeuristicConfig,
) -> Pos {
    let ideal = heuristics.ideal_range_for(unit.max_attack_range());
    let score = |cell: Pos| {
        let gap: i32 = opponents.iter().map(|&p| (cell.distance_to(p) - ideal).abs()).sum();
        let edge = if board.is_edge(cell) { heuristics.edge_penalty } else { 0 };
        gap + edge
    };

    let mut best = (from, score(from));
    for cell in sorted(board.reachable(from, unit.move_range)) {
        let s = score(cell);
        if s < best.1 {
            best = (cell, s);
        }
    }
    best.0
}

/// Reachable cell with the least incoming threat.
///
/// An opponent threatens `2 * dmg` where its best attack reaches, and
/// `dmg / distance` elsewhere.
pub fn escape_move(board: &Board, from: Pos, unit: &Unit) -> Pos {
    let threats: Vec<(Pos, i32, i32)> = board
        .units_of(unit.owner.opponent())
        .into_iter()
        .filter_map(|(pos, u)| u.best_attack().map(|a| (pos, a.dmg, a.range)))
        .collect();

    let threat = |cell: Pos| -> f32 {
        threats
            .iter()
            .map(|&(pos, dmg, range)| {
                let dist = cell.distance_to(pos);
                if dist <= range {
                    (dmg * 2) as f32
                } else {
                    dmg as f32 / dist.max(1) as f32
                }
            })
            .sum()
    };

    let mut best = (from, threat(from));
    for cell in sorted(board.reachable(from, unit.move_range)) {
        let t = threat(cell);
        if t < best.1 {
            best = (cell, t);
        }
    }
    best.0
}

/// Support cast worth making: `(attack index, target cell)`.
///
/// Looks for the most wounded ally below `heal_hp_ratio` that has never been
/// healed and can be covered by one of the unit's zone attacks.
pub fn support_target(
    board: &Board,
    from: Pos,
    unit: &Unit,
    heuristics: &HeuristicConfig,
) -> Option<(usize, Pos)> {
    let mut wounded: Vec<(Pos, f32)> = board
        .units_of(unit.owner)
        .into_iter()
        .filter(|(_, ally)| !ally.healed_once && ally.hp_ratio() < heuristics.heal_hp_ratio)
        .map(|(pos, ally)| (pos, ally.hp_ratio()))
        .collect();
    wounded.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (ally_pos, _) in wounded {
        for (index, attack) in unit.attacks.iter().enumerate() {
            let cells: Vec<Pos> = match attack.effect {
                AttackEffect::CrossSupport => vec![ally_pos],
                AttackEffect::FusionSupport => ally_pos
                    .neighbors8()
                    .into_iter()
                    .filter(|&p| board.in_bounds(p))
                    .collect(),
                _ => continue,
            };
            if let Some(cell) = cells.into_iter().find(|&c| attack.covers(from.distance_to(c))) {
                return Some((index, cell));
            }
        }
    }
    None
}

/// Heuristic decision for one unit, or None when it has nothing useful to do
pub fn unit_action(board: &Board, from: Pos, heuristics: &HeuristicConfig) -> Option<Action> {
    let unit = board.occupant(from)?;

    if let Some((attack, target)) = support_target(board, from, unit, heuristics) {
        return Some(Action::Attack { from, target, attack });
    }

    if let Some(target) = best_target(board, from, unit) {
        if let Some(attack) = element_attack_pick(unit, from.distance_to(target)) {
            return Some(Action::Attack { from, target, attack });
        }
    }

    let opponents: Vec<Pos> = board
        .units_of(unit.owner.opponent())
        .into_iter()
        .map(|(pos, _)| pos)
        .collect();
    if opponents.is_empty() {
        return None;
    }

    let to = if unit.hp_ratio() < heuristics.retreat_hp_ratio {
        escape_move(board, from, unit)
    } else {
        nearest_approach_move(board, from, unit, &opponents, heuristics)
    };
    (to != from).then_some(Action::Move { from, to })
}

/// Heuristic decision for a whole side.
///
/// Units are tried in priority order: able to attack right now, then lowest
/// hp ratio, then nearest to an opponent. The first unit with a useful
/// action acts.
pub fn fallback_action(board: &Board, side: Owner, heuristics: &HeuristicConfig) -> Option<Action> {
    let opponents: Vec<Pos> = board
        .units_of(side.opponent())
        .into_iter()
        .map(|(pos, _)| pos)
        .collect();
    if opponents.is_empty() {
        return None;
    }

    let mut order: Vec<(Pos, bool, f32, i32)> = board
        .units_of(side)
        .into_iter()
        .map(|(pos, unit)| {
            let nearest = opponents.iter().map(|&p| pos.distance_to(p)).min().unwrap_or(i32::MAX);
            let can_act = unit.offensive_attacks().any(|(_, a)| a.covers(nearest));
            (pos, !can_act, unit.hp_ratio(), nearest)
        })
        .collect();
    order.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.total_cmp(&b.2)).then(a.3.cmp(&b.3)));

    order
        .into_iter()
        .find_map(|(pos, ..)| unit_action(board, pos, heuristics))
}
