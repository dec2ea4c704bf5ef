//! Square grid geometry, occupancy and bounded reachability

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::unit::{Owner, Unit, UnitId};

/// Default grid width
pub const GRID_COLS: i8 = 23;
/// Default grid height
pub const GRID_ROWS: i8 = 11;

/// Grid coordinates (column, row)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub col: i8,
    pub row: i8,
}

impl Pos {
    pub const fn new(col: i8, row: i8) -> Self {
        Self { col, row }
    }

    /// Manhattan distance
    pub fn distance_to(&self, other: Pos) -> i32 {
        (self.col as i32 - other.col as i32).abs() + (self.row as i32 - other.row as i32).abs()
    }

    /// Shifted position, None when a coordinate leaves the `i8` range
    pub fn offset(&self, dc: i8, dr: i8) -> Option<Pos> {
        Some(Pos::new(self.col.checked_add(dc)?, self.row.checked_add(dr)?))
    }

    /// 4-connected neighbours (E, W, S, N)
    pub fn neighbors4(&self) -> Vec<Pos> {
        ORTHOGONAL.iter().filter_map(|&(dc, dr)| self.offset(dc, dr)).collect()
    }

    /// All 8 surrounding cells
    pub fn neighbors8(&self) -> Vec<Pos> {
        SURROUNDING.iter().filter_map(|&(dc, dr)| self.offset(dc, dr)).collect()
    }

    /// Center plus the 4-neighbourhood
    pub fn plus_pattern(&self) -> Vec<Pos> {
        let mut cells = vec![*self];
        cells.extend(self.neighbors4());
        cells
    }
}

/// Orthogonal direction vectors (dcol, drow)
pub const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Orthogonal then diagonal direction vectors
pub const SURROUNDING: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
];

/// Breadth-first expansion over empty cells.
///
/// Never steps through a blocked cell; the origin is always included even
/// when occupied. Shared by the live board and search snapshots.
pub fn reachable_cells<F>(
    origin: Pos,
    max_distance: u32,
    cols: i8,
    rows: i8,
    is_blocked: F,
) -> FxHashSet<Pos>
where
    F: Fn(Pos) -> bool,
{
    let mut visited = FxHashSet::default();
    visited.insert(origin);

    let mut frontier = VecDeque::new();
    frontier.push_back((origin, 0u32));

    while let Some((pos, dist)) = frontier.pop_front() {
        if dist >= max_distance {
            continue;
        }
        for next in pos.neighbors4() {
            let inside = next.col >= 0 && next.row >= 0 && next.col < cols && next.row < rows;
            if !inside || visited.contains(&next) || is_blocked(next) {
                continue;
            }
            visited.insert(next);
            frontier.push_back((next, dist + 1));
        }
    }

    visited
}

/// Sorted copy of a position set, for deterministic iteration
pub fn sorted(cells: FxHashSet<Pos>) -> Vec<Pos> {
    let mut cells: Vec<Pos> = cells.into_iter().collect();
    cells.sort();
    cells
}

// ============================================================================
// BOARD
// ============================================================================

/// Live board: fixed-size grid with at most one unit per cell
#[derive(Clone, Debug)]
pub struct Board {
    cols: i8,
    rows: i8,
    cells: FxHashMap<Pos, Unit>,
    next_id: u32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(GRID_COLS, GRID_ROWS)
    }
}

impl Board {
    pub fn new(cols: i8, rows: i8) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            cells: FxHashMap::default(),
            next_id: 1,
        }
    }

    pub fn cols(&self) -> i8 {
        self.cols
    }

    pub fn rows(&self) -> i8 {
        self.rows
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.col >= 0 && pos.row >= 0 && pos.col < self.cols && pos.row < self.rows
    }

    pub fn is_edge(&self, pos: Pos) -> bool {
        pos.col == 0 || pos.row == 0 || pos.col == self.cols - 1 || pos.row == self.rows - 1
    }

    pub fn occupant(&self, pos: Pos) -> Option<&Unit> {
        self.cells.get(&pos)
    }

    pub fn occupant_mut(&mut self, pos: Pos) -> Option<&mut Unit> {
        self.cells.get_mut(&pos)
    }

    pub fn is_empty(&self, pos: Pos) -> bool {
        !self.cells.contains_key(&pos)
    }

    /// Place a unit, assigning it a fresh id
    pub fn place(&mut self, pos: Pos, mut unit: Unit) -> Result<UnitId, BoardError> {
        if !self.in_bounds(pos) {
            return Err(BoardError::OutOfBounds(pos));
        }
        if self.cells.contains_key(&pos) {
            return Err(BoardError::Occupied(pos));
        }
        let id = UnitId(self.next_id);
        self.next_id += 1;
        unit.id = id;
        self.cells.insert(pos, unit);
        Ok(id)
    }

    pub fn remove(&mut self, pos: Pos) -> Option<Unit> {
        self.cells.remove(&pos)
    }

    /// Relocate a unit to an empty in-bounds cell
    pub fn move_unit(&mut self, from: Pos, to: Pos) -> bool {
        if from == to || !self.in_bounds(to) || self.cells.contains_key(&to) {
            return false;
        }
        match self.cells.remove(&from) {
            Some(unit) => {
                self.cells.insert(to, unit);
                true
            }
            None => false,
        }
    }

    pub fn position_of(&self, id: UnitId) -> Option<Pos> {
        self.cells
            .iter()
            .find(|(_, unit)| unit.id == id)
            .map(|(&pos, _)| pos)
    }

    /// Units in column-major order
    pub fn units(&self) -> Vec<(Pos, &Unit)> {
        let mut units: Vec<(Pos, &Unit)> = self.cells.iter().map(|(&p, u)| (p, u)).collect();
        units.sort_by_key(|(pos, _)| *pos);
        units
    }

    pub fn units_of(&self, owner: Owner) -> Vec<(Pos, &Unit)> {
        self.units()
            .into_iter()
            .filter(|(_, unit)| unit.owner == owner)
            .collect()
    }

    pub fn count(&self, owner: Owner) -> usize {
        self.cells.values().filter(|u| u.owner == owner).count()
    }

    pub fn empty_cells(&self) -> Vec<Pos> {
        let mut cells = Vec::new();
        for col in 0..self.cols {
            for row in 0..self.rows {
                let pos = Pos::new(col, row);
                if self.is_empty(pos) {
                    cells.push(pos);
                }
            }
        }
        cells
    }

    /// Cells reachable within `max_distance` orthogonal steps without
    /// passing through another unit, plus the origin
    pub fn reachable(&self, origin: Pos, max_distance: u32) -> FxHashSet<Pos> {
        reachable_cells(origin, max_distance, self.cols, self.rows, |p| {
            self.cells.contains_key(&p)
        })
    }
}
