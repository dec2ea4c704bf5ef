//! Error types

use thiserror::Error;

use crate::board::Pos;

/// Placement failures reported to the placement/draft collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("position ({}, {}) is outside the board", .0.col, .0.row)]
    OutOfBounds(Pos),

    #[error("position ({}, {}) is already occupied", .0.col, .0.row)]
    Occupied(Pos),

    #[error("no free cell left for placement")]
    NoFreeCell,
}

/// Internal faults while exploring the game tree.
///
/// These never reach the turn loop: the battle driver logs them and falls
/// back to the heuristic selectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("no live unit at ({}, {})", .0.col, .0.row)]
    MissingUnit(Pos),

    #[error("unit at ({}, {}) has no attack #{index}", .pos.col, .pos.row)]
    InvalidAttack { pos: Pos, index: usize },

    #[error("destination ({}, {}) is occupied", .0.col, .0.row)]
    OccupiedDestination(Pos),
}

/// Illegal moves in the card draft
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("card pool has {available} cards, the draft needs at least {needed}")]
    PoolTooSmall { needed: usize, available: usize },

    #[error("it is not this side's turn")]
    NotYourTurn,

    #[error("deck is already full")]
    DeckFull,

    #[error("swap requires a full deck")]
    DeckNotFull,

    #[error("no card at index {0}")]
    NoSuchCard(usize),

    #[error("draft is complete")]
    Complete,
}
