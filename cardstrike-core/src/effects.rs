//! Damage and heal over time, ticked once per turn cycle

use serde::{Deserialize, Serialize};

use crate::board::{Board, Pos};
use crate::unit::{Owner, UnitId};

/// Burning ground left by a trail attack
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlameTile {
    pub pos: Pos,
    /// Units of this side are never hurt by the tile
    pub owner: Owner,
    pub damage: i32,
    pub ticks_left: i32,
}

/// Regen or burn registered on a unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverTime {
    pub unit: UnitId,
    pub amount: i32,
    pub ticks_left: i32,
}

/// Something that happened while ticking the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectEvent {
    Flame { pos: Pos, unit: UnitId, damage: i32, died: bool },
    Regen { pos: Pos, unit: UnitId, healed: i32 },
    Burn { pos: Pos, unit: UnitId, damage: i32, died: bool },
}

/// Pending delayed effects of a battle.
///
/// Three independent queues; entries for the same unit or tile may coexist.
#[derive(Clone, Debug, Default)]
pub struct EffectLedger {
    flame_tiles: Vec<FlameTile>,
    regen: Vec<OverTime>,
    burn: Vec<OverTime>,
}

impl EffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flame_tiles(&self) -> &[FlameTile] {
        &self.flame_tiles
    }

    pub fn regen_entries(&self) -> &[OverTime] {
        &self.regen
    }

    pub fn burn_entries(&self) -> &[OverTime] {
        &self.burn
    }

    pub fn flame_at(&self, pos: Pos) -> Option<&FlameTile> {
        self.flame_tiles.iter().find(|t| t.pos == pos)
    }

    pub fn is_empty(&self) -> bool {
        self.flame_tiles.is_empty() && self.regen.is_empty() && self.burn.is_empty()
    }

    /// Add a burning tile unless one already burns there
    pub fn add_flame_tile(&mut self, pos: Pos, owner: Owner, damage: i32, ticks: i32) -> bool {
        if self.flame_at(pos).is_some() {
            return false;
        }
        self.flame_tiles.push(FlameTile { pos, owner, damage, ticks_left: ticks });
        true
    }

    pub fn register_regen(&mut self, unit: UnitId, amount: i32, ticks: i32) {
        self.regen.push(OverTime { unit, amount, ticks_left: ticks });
    }

    pub fn register_burn(&mut self, unit: UnitId, amount: i32, ticks: i32) {
        self.burn.push(OverTime { unit, amount, ticks_left: ticks });
    }

    /// Advance every queue by one tick
    pub fn tick(&mut self, board: &mut Board) -> Vec<EffectEvent> {
        let mut events = Vec::new();
        self.tick_flames(board, &mut events);
        self.tick_regen(board, &mut events);
        self.tick_burn(board, &mut events);
        events
    }

    /// Expired tiles vanish without dealing damage on their last tick
    fn tick_flames(&mut self, board: &mut Board, events: &mut Vec<EffectEvent>) {
        self.flame_tiles.retain_mut(|tile| {
            tile.ticks_left -= 1;
            if tile.ticks_left <= 0 {
                return false;
            }

            let Some(unit) = board.occupant_mut(tile.pos) else {
                return true;
            };
            if unit.owner == tile.owner {
                return true;
            }

            unit.suffer(tile.damage);
            let id = unit.id;
            let died = !unit.is_alive();
            if died {
                board.remove(tile.pos);
            }
            events.push(EffectEvent::Flame { pos: tile.pos, unit: id, damage: tile.damage, died });
            true
        });
    }

    fn tick_regen(&mut self, board: &mut Board, events: &mut Vec<EffectEvent>) {
        self.regen.retain_mut(|entry| {
            entry.ticks_left -= 1;

            // Target already gone: drop without touching anything
            let Some(pos) = board.position_of(entry.unit) else {
                return false;
            };
            let Some(unit) = board.occupant_mut(pos) else {
                return false;
            };

            let healed = unit.heal(entry.amount);
            events.push(EffectEvent::Regen { pos, unit: entry.unit, healed });
            entry.ticks_left > 0
        });
    }

    fn tick_burn(&mut self, board: &mut Board, events: &mut Vec<EffectEvent>) {
        self.burn.retain_mut(|entry| {
            entry.ticks_left -= 1;

            let Some(pos) = board.position_of(entry.unit) else {
                return false;
            };
            let Some(unit) = board.occupant_mut(pos) else {
                return false;
            };

            unit.suffer(entry.amount);
            let died = !unit.is_alive();
            if died {
                board.remove(pos);
            }
            events.push(EffectEvent::Burn { pos, unit: entry.unit, damage: entry.amount, died });
            !died && entry.ticks_left > 0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Attack, Element, Unit};

    fn unit(owner: Owner, hp: i32) -> Unit {
        Unit::new(owner, "u", 40, vec![Attack::new("Strike", 10, Element::Null, 2)], 2, Element::Null)
            .with_hp(hp)
    }

    #[test]
    fn test_flame_hurts_only_opponents() {
        let mut board = Board::new(6, 3);
        board.place(Pos::new(1, 1), unit(Owner::Player, 40)).unwrap();
        board.place(Pos::new(2, 1), unit(Owner::Enemy, 40)).unwrap();

        let mut ledger = EffectLedger::new();
        assert!(ledger.add_flame_tile(Pos::new(1, 1), Owner::Enemy, 5, 3));
        assert!(ledger.add_flame_tile(Pos::new(2, 1), Owner::Enemy, 5, 3));
        assert!(!ledger.add_flame_tile(Pos::new(2, 1), Owner::Player, 5, 3));

        let events = ledger.tick(&mut board);
        assert_eq!(events.len(), 1);
        assert_eq!(board.occupant(Pos::new(1, 1)).unwrap().hp, 35);
        assert_eq!(board.occupant(Pos::new(2, 1)).unwrap().hp, 40);
    }

    #[test]
    fn test_flame_expires_without_damage() {
        let mut board = Board::new(3, 3);
        board.place(Pos::new(0, 0), unit(Owner::Player, 40)).unwrap();
        let mut ledger = EffectLedger::new();
        ledger.add_flame_tile(Pos::new(0, 0), Owner::Enemy, 5, 3);

        ledger.tick(&mut board);
        ledger.tick(&mut board);
        assert_eq!(board.occupant(Pos::new(0, 0)).unwrap().hp, 30);
        assert_eq!(ledger.flame_tiles().len(), 1);

        let events = ledger.tick(&mut board);
        assert!(events.is_empty());
        assert!(ledger.flame_tiles().is_empty());
        assert_eq!(board.occupant(Pos::new(0, 0)).unwrap().hp, 30);
    }

    #[test]
    fn test_flame_kills_and_vacates() {
        let mut board = Board::new(3, 3);
        board.place(Pos::new(1, 1), unit(Owner::Player, 4)).unwrap();
        let mut ledger = EffectLedger::new();
        ledger.add_flame_tile(Pos::new(1, 1), Owner::Enemy, 5, 3);

        let events = ledger.tick(&mut board);
        assert!(matches!(events[0], EffectEvent::Flame { died: true, .. }));
        assert!(board.is_empty(Pos::new(1, 1)));
    }

    #[test]
    fn test_regen_follows_moved_unit_and_expires() {
        let mut board = Board::new(4, 4);
        let id = board.place(Pos::new(0, 0), unit(Owner::Enemy, 20)).unwrap();
        let mut ledger = EffectLedger::new();
        ledger.register_regen(id, 5, 2);

        board.move_unit(Pos::new(0, 0), Pos::new(3, 3));
        ledger.tick(&mut board);
        assert_eq!(board.occupant(Pos::new(3, 3)).unwrap().hp, 25);
        ledger.tick(&mut board);
        assert_eq!(board.occupant(Pos::new(3, 3)).unwrap().hp, 30);
        assert!(ledger.regen_entries().is_empty());
    }

    #[test]
    fn test_dead_target_entries_dropped_without_effect() {
        let mut board = Board::new(4, 4);
        let healed = board.place(Pos::new(0, 0), unit(Owner::Enemy, 20)).unwrap();
        let burned = board.place(Pos::new(1, 0), unit(Owner::Player, 20)).unwrap();
        let mut ledger = EffectLedger::new();
        ledger.register_regen(healed, 5, 3);
        ledger.register_burn(burned, 8, 3);

        board.remove(Pos::new(0, 0));
        board.remove(Pos::new(1, 0));
        let events = ledger.tick(&mut board);

        assert!(events.is_empty());
        assert!(ledger.is_empty());
        assert_eq!(board.count(Owner::Enemy) + board.count(Owner::Player), 0);
    }

    #[test]
    fn test_burn_kills_and_drops_entry() {
        let mut board = Board::new(4, 4);
        let id = board.place(Pos::new(2, 2), unit(Owner::Player, 10)).unwrap();
        let mut ledger = EffectLedger::new();
        ledger.register_burn(id, 8, 2);

        ledger.tick(&mut board);
        assert_eq!(board.occupant(Pos::new(2, 2)).unwrap().hp, 2);
        let events = ledger.tick(&mut board);
        assert!(matches!(events[0], EffectEvent::Burn { died: true, .. }));
        assert!(board.is_empty(Pos::new(2, 2)));
        assert!(ledger.burn_entries().is_empty());
    }

    #[test]
    fn test_burn_ignores_shield() {
        let mut board = Board::new(2, 2);
        let id = board
            .place(Pos::new(0, 0), unit(Owner::Player, 30).with_shield(10))
            .unwrap();
        let mut ledger = EffectLedger::new();
        ledger.register_burn(id, 8, 1);
        ledger.tick(&mut board);
        let u = board.occupant(Pos::new(0, 0)).unwrap();
        assert_eq!((u.hp, u.shield), (22, 10));
    }
}
