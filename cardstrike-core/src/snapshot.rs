//! Lightweight board copies for search
//!
//! A [`Snapshot`] is a flat vector of [`UnitRecord`]s plus the grid size.
//! Cloning it copies the records and bumps the attack list refcounts, nothing
//! else; positions are plain coordinates so clones never alias each other or
//! the live board.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::board::{reachable_cells, sorted, Board, Pos};
use crate::combat::{absorb_hit, hit_damage};
use crate::error::SearchError;
use crate::unit::{Attack, Element, Owner, Rarity, Unit, UnitId};

/// A decision the AI can take for one unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Use `attack` (index into the unit's attack list) on the unit at `target`
    Attack { from: Pos, target: Pos, attack: usize },
    Move { from: Pos, to: Pos },
}

impl Action {
    /// Position of the acting unit
    pub fn actor(&self) -> Pos {
        match *self {
            Action::Attack { from, .. } | Action::Move { from, .. } => from,
        }
    }

    pub fn is_attack(&self) -> bool {
        matches!(self, Action::Attack { .. })
    }
}

/// Search-time copy of a unit
#[derive(Clone, Debug)]
pub struct UnitRecord {
    pub id: UnitId,
    pub owner: Owner,
    pub hp: i32,
    pub max_hp: i32,
    pub shield: i32,
    pub move_range: u32,
    pub element: Element,
    pub rarity: Rarity,
    pub attacks: Arc<[Attack]>,
    pub pos: Pos,
}

impl UnitRecord {
    pub fn from_unit(pos: Pos, unit: &Unit) -> Self {
        Self {
            id: unit.id,
            owner: unit.owner,
            hp: unit.hp,
            max_hp: unit.max_hp,
            shield: unit.shield,
            move_range: unit.move_range,
            element: unit.element,
            rarity: unit.rarity,
            attacks: Arc::clone(&unit.attacks),
            pos,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hp_ratio(&self) -> f32 {
        self.hp as f32 / self.max_hp.max(1) as f32
    }

    pub fn offensive_attacks(&self) -> impl Iterator<Item = (usize, &Attack)> + '_ {
        self.attacks.iter().enumerate().filter(|(_, a)| !a.is_support)
    }

    pub fn best_damage(&self) -> i32 {
        self.offensive_attacks().map(|(_, a)| a.dmg).max().unwrap_or(0)
    }

    pub fn max_attack_range(&self) -> Option<i32> {
        self.attacks.iter().map(|a| a.range).max()
    }
}

/// Cheaply clonable board state owned by one search branch
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub cols: i8,
    pub rows: i8,
    units: Vec<UnitRecord>,
}

impl Snapshot {
    /// Copy the live board; records come out in position order
    pub fn from_board(board: &Board) -> Self {
        let units = board
            .units()
            .into_iter()
            .filter(|(_, u)| u.is_alive())
            .map(|(pos, u)| UnitRecord::from_unit(pos, u))
            .collect();
        Self { cols: board.cols(), rows: board.rows(), units }
    }

    pub fn units(&self) -> &[UnitRecord] {
        &self.units
    }

    pub fn units_of(&self, owner: Owner) -> impl Iterator<Item = &UnitRecord> + '_ {
        self.units.iter().filter(move |u| u.owner == owner && u.is_alive())
    }

    pub fn count(&self, owner: Owner) -> usize {
        self.units_of(owner).count()
    }

    pub fn unit_at(&self, pos: Pos) -> Option<&UnitRecord> {
        self.index_at(pos).map(|i| &self.units[i])
    }

    fn index_at(&self, pos: Pos) -> Option<usize> {
        self.units.iter().position(|u| u.pos == pos && u.is_alive())
    }

    /// One side has no units left
    pub fn is_terminal(&self) -> bool {
        self.count(Owner::Player) == 0 || self.count(Owner::Enemy) == 0
    }

    /// Bounded reachability against this snapshot's occupancy
    pub fn reachable(&self, origin: Pos, max_distance: u32) -> FxHashSet<Pos> {
        reachable_cells(origin, max_distance, self.cols, self.rows, |p| {
            self.index_at(p).is_some()
        })
    }

    /// Legal actions for `side`, attacks before moves for each unit.
    ///
    /// Empty when either side has no live units.
    pub fn generate_actions(&self, side: Owner) -> Vec<Action> {
        let mut actions = Vec::new();
        let enemies: Vec<&UnitRecord> = self.units_of(side.opponent()).collect();
        if enemies.is_empty() {
            return actions;
        }

        for unit in self.units_of(side) {
            for (index, attack) in unit.offensive_attacks() {
                for enemy in &enemies {
                    if attack.covers(unit.pos.distance_to(enemy.pos)) {
                        actions.push(Action::Attack { from: unit.pos, target: enemy.pos, attack: index });
                    }
                }
            }

            for to in sorted(self.reachable(unit.pos, unit.move_range)) {
                if to != unit.pos {
                    actions.push(Action::Move { from: unit.pos, to });
                }
            }
        }

        actions
    }

    /// Apply an action with the simulated damage formula, returning hp damage dealt.
    ///
    /// `jitter` is added to the base damage (zero for expected-value search).
    /// Attacks against allies or out of range do nothing, like the real engine.
    pub fn apply(&mut self, action: Action, jitter: i32, cap_fraction: f32) -> Result<i32, SearchError> {
        match action {
            Action::Attack { from, target, attack } => {
                let ai = self.index_at(from).ok_or(SearchError::MissingUnit(from))?;
                let ti = self.index_at(target).ok_or(SearchError::MissingUnit(target))?;

                let attacker = &self.units[ai];
                let atk = attacker
                    .attacks
                    .get(attack)
                    .ok_or(SearchError::InvalidAttack { pos: from, index: attack })?;
                let distance = from.distance_to(target);
                if attacker.owner == self.units[ti].owner || !atk.covers(distance) {
                    return Ok(0);
                }

                let damage = hit_damage(atk, attacker.rarity, distance, jitter, self.units[ti].max_hp, cap_fraction);
                let victim = &mut self.units[ti];
                let hit = absorb_hit(&mut victim.shield, &mut victim.hp, damage);
                if !victim.is_alive() {
                    self.remove_dead();
                }
                Ok(hit.dealt)
            }
            Action::Move { from, to } => {
                let index = self.index_at(from).ok_or(SearchError::MissingUnit(from))?;
                if to != from && self.index_at(to).is_some() {
                    return Err(SearchError::OccupiedDestination(to));
                }
                self.units[index].pos = to;
                Ok(0)
            }
        }
    }

    pub fn remove_dead(&mut self) {
        self.units.retain(|u| u.is_alive());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(owner: Owner, attacks: Vec<Attack>, move_range: u32) -> Unit {
        Unit::new(owner, "card", 40, attacks, move_range, Element::Null)
    }

    fn duel() -> Board {
        let mut board = Board::new(6, 6);
        board
            .place(
                Pos::new(0, 0),
                card(
                    Owner::Enemy,
                    vec![
                        Attack::new("Strike", 12, Element::Null, 3),
                        Attack::new("Healing Wave", 8, Element::Water, 4).support(),
                    ],
                    1,
                ),
            )
            .unwrap();
        board
            .place(Pos::new(0, 3), card(Owner::Player, vec![Attack::new("Strike", 12, Element::Null, 2)], 1))
            .unwrap();
        board
    }

    #[test]
    fn test_snapshot_does_not_alias_board() {
        let board = duel();
        let mut snap = Snapshot::from_board(&board);
        snap.apply(Action::Attack { from: Pos::new(0, 0), target: Pos::new(0, 3), attack: 0 }, 0, 0.25)
            .unwrap();
        assert_eq!(snap.unit_at(Pos::new(0, 3)).unwrap().hp, 31);
        assert_eq!(board.occupant(Pos::new(0, 3)).unwrap().hp, 40);

        let clone = snap.clone();
        snap.apply(Action::Move { from: Pos::new(0, 0), to: Pos::new(1, 0) }, 0, 0.25).unwrap();
        assert!(clone.unit_at(Pos::new(0, 0)).is_some());
        assert!(snap.unit_at(Pos::new(0, 0)).is_none());
    }

    #[test]
    fn test_generation_skips_support_and_orders_attacks_first() {
        let snap = Snapshot::from_board(&duel());
        let actions = snap.generate_actions(Owner::Enemy);
        // One attack in range, support skipped, then (0,1) and (1,0)
        assert_eq!(
            actions,
            vec![
                Action::Attack { from: Pos::new(0, 0), target: Pos::new(0, 3), attack: 0 },
                Action::Move { from: Pos::new(0, 0), to: Pos::new(0, 1) },
                Action::Move { from: Pos::new(0, 0), to: Pos::new(1, 0) },
            ]
        );

        // Player strike at range 2 cannot reach distance 3
        assert!(snap.generate_actions(Owner::Player).iter().all(|a| !a.is_attack()));
    }

    #[test]
    fn test_generation_empty_without_opponents() {
        let mut board = Board::new(4, 4);
        board.place(Pos::new(1, 1), card(Owner::Enemy, vec![Attack::new("Strike", 12, Element::Null, 3)], 2)).unwrap();
        let snap = Snapshot::from_board(&board);
        assert!(snap.generate_actions(Owner::Enemy).is_empty());
        assert!(snap.is_terminal());
    }

    #[test]
    fn test_generated_moves_respect_snapshot_occupancy() {
        let mut board = Board::new(3, 1);
        board.place(Pos::new(0, 0), card(Owner::Enemy, vec![Attack::new("Bite", 5, Element::Null, 1)], 3)).unwrap();
        board.place(Pos::new(2, 0), card(Owner::Player, vec![Attack::new("Bite", 5, Element::Null, 1)], 3)).unwrap();
        let mut snap = Snapshot::from_board(&board);
        snap.apply(Action::Move { from: Pos::new(2, 0), to: Pos::new(1, 0) }, 0, 0.25).unwrap();

        // Boxed in by the moved player unit: only the attack remains
        let actions = snap.generate_actions(Owner::Enemy);
        assert_eq!(actions, vec![Action::Attack { from: Pos::new(0, 0), target: Pos::new(1, 0), attack: 0 }]);
    }

    #[test]
    fn test_kill_removes_record() {
        let mut board = duel();
        board.occupant_mut(Pos::new(0, 3)).unwrap().hp = 5;
        let mut snap = Snapshot::from_board(&board);
        let dealt = snap
            .apply(Action::Attack { from: Pos::new(0, 0), target: Pos::new(0, 3), attack: 0 }, 0, 0.25)
            .unwrap();
        assert_eq!(dealt, 9);
        assert_eq!(snap.count(Owner::Player), 0);
        assert_eq!(snap.units().len(), 1);
    }

    #[test]
    fn test_shield_absorbs_in_simulation() {
        let mut board = duel();
        board.occupant_mut(Pos::new(0, 3)).unwrap().shield = 4;
        let mut snap = Snapshot::from_board(&board);
        let dealt = snap
            .apply(Action::Attack { from: Pos::new(0, 0), target: Pos::new(0, 3), attack: 0 }, 0, 0.25)
            .unwrap();
        // 12 - 3 = 9, shield takes 4
        assert_eq!(dealt, 5);
        let target = snap.unit_at(Pos::new(0, 3)).unwrap();
        assert_eq!((target.hp, target.shield), (35, 0));
    }

    #[test]
    fn test_stale_actions_are_errors() {
        let mut snap = Snapshot::from_board(&duel());
        assert_eq!(
            snap.apply(Action::Move { from: Pos::new(5, 5), to: Pos::new(4, 5) }, 0, 0.25),
            Err(SearchError::MissingUnit(Pos::new(5, 5)))
        );
        assert_eq!(
            snap.apply(Action::Move { from: Pos::new(0, 0), to: Pos::new(0, 3) }, 0, 0.25),
            Err(SearchError::OccupiedDestination(Pos::new(0, 3)))
        );
        assert_eq!(
            snap.apply(Action::Attack { from: Pos::new(0, 0), target: Pos::new(0, 3), attack: 7 }, 0, 0.25),
            Err(SearchError::InvalidAttack { pos: Pos::new(0, 0), index: 7 })
        );
    }
}
