//! Pre-battle card draft
//!
//! Each side is dealt a hand from the pool. Sides alternate, the player
//! first, either retaining a card from their own hand or stealing one from
//! the opponent's hand, until both decks hold [`DECK_SIZE`] cards. A side
//! whose deck is full may swap its weakest deck card for an opponent card,
//! or pass.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DraftError;
use crate::roster::{CardDef, CardPool};
use crate::unit::{Owner, Unit};

pub const HAND_SIZE: usize = 5;
pub const DECK_SIZE: usize = 3;

/// Steal only when the best steal beats the best retain by this factor
const STEAL_RATIO: f32 = 1.1;
/// A full deck swaps only for a card this much better than its worst
const SWAP_MARGIN: i32 = 15;
/// Minimum timing-adjusted value of a card worth stealing
const STEAL_GAIN_THRESHOLD: f32 = 30.0;

// ============================================================================
// CARD AND DECK VALUE
// ============================================================================

/// Draft score of a card: hp plus total attack damage
pub fn card_score(card: &CardDef) -> i32 {
    card.score()
}

/// Strength of a unit: health share plus average attack damage
pub fn unit_value(unit: &Unit) -> f32 {
    let avg_dmg = if unit.attacks.is_empty() {
        0.0
    } else {
        unit.attacks.iter().map(|a| a.dmg).sum::<i32>() as f32 / unit.attacks.len() as f32
    };
    unit.hp_ratio() * 50.0 + avg_dmg * 2.0
}

/// Strength of a whole deck, with 10 points per distinct element
pub fn deck_score(deck: &[Unit]) -> f32 {
    let mut elements: Vec<_> = deck.iter().map(|u| u.element).collect();
    elements.sort_by_key(|e| e.name());
    elements.dedup();
    deck.iter().map(unit_value).sum::<f32>() + elements.len() as f32 * 10.0
}

/// Phase of a game, by turn number
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnWindow {
    Early,
    Mid,
    Late,
}

impl TurnWindow {
    pub fn from_turn(turn: u32) -> Self {
        match turn {
            0..=5 => TurnWindow::Early,
            6..=15 => TurnWindow::Mid,
            _ => TurnWindow::Late,
        }
    }

    /// Stealing pays off more early on
    pub fn steal_modifier(self) -> f32 {
        match self {
            TurnWindow::Early => 1.2,
            TurnWindow::Mid => 1.0,
            TurnWindow::Late => 0.8,
        }
    }
}

/// Whether a card of the given value is worth a steal in this window
pub fn worth_stealing(value: f32, window: TurnWindow) -> bool {
    value * window.steal_modifier() > STEAL_GAIN_THRESHOLD
}

// ============================================================================
// DRAFT STATE
// ============================================================================

/// One draft decision; indices point into hands or decks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftMove {
    /// Move a card from the own hand to the own deck
    Retain(usize),
    /// Move a card from the opponent's hand to the own deck
    Steal(usize),
    /// Take an opponent hand card, discarding an own deck card
    Swap { steal: usize, discard: usize },
    Pass,
}

#[derive(Clone, Debug)]
pub struct DraftState {
    pool: Vec<CardDef>,
    hands: [Vec<usize>; 2],
    decks: [Vec<usize>; 2],
    turn: Owner,
    turns_taken: u32,
}

fn slot(side: Owner) -> usize {
    match side {
        Owner::Player => 0,
        Owner::Enemy => 1,
    }
}

impl DraftState {
    /// Deal up to two hands from a shuffled pool
    pub fn deal<R: Rng>(pool: &CardPool, rng: &mut R) -> Result<Self, DraftError> {
        let needed = 2 * DECK_SIZE;
        if pool.len() < needed {
            return Err(DraftError::PoolTooSmall { needed, available: pool.len() });
        }

        let dealt = index::sample(rng, pool.len(), pool.len().min(2 * HAND_SIZE)).into_vec();
        let (player, cpu) = dealt.split_at(dealt.len().div_ceil(2));
        Ok(Self::with_hands(pool.cards.clone(), player.to_vec(), cpu.to_vec()))
    }

    /// Draft over fixed hands (indices into `pool`)
    pub fn with_hands(pool: Vec<CardDef>, player_hand: Vec<usize>, cpu_hand: Vec<usize>) -> Self {
        Self {
            pool,
            hands: [player_hand, cpu_hand],
            decks: [Vec::new(), Vec::new()],
            turn: Owner::Player,
            turns_taken: 0,
        }
    }

    pub fn turn(&self) -> Owner {
        self.turn
    }

    pub fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    pub fn hand(&self, side: Owner) -> Vec<&CardDef> {
        self.hands[slot(side)].iter().map(|&i| &self.pool[i]).collect()
    }

    pub fn deck(&self, side: Owner) -> Vec<&CardDef> {
        self.decks[slot(side)].iter().map(|&i| &self.pool[i]).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.decks.iter().all(|d| d.len() >= DECK_SIZE)
    }

    /// Apply a move for `side`, then hand the turn over
    pub fn apply(&mut self, side: Owner, mv: DraftMove) -> Result<(), DraftError> {
        if self.is_complete() {
            return Err(DraftError::Complete);
        }
        if side != self.turn {
            return Err(DraftError::NotYourTurn);
        }

        let own = slot(side);
        let other = slot(side.opponent());
        let deck_full = self.decks[own].len() >= DECK_SIZE;

        match mv {
            DraftMove::Retain(i) | DraftMove::Steal(i) => {
                if deck_full {
                    return Err(DraftError::DeckFull);
                }
                let from = if matches!(mv, DraftMove::Retain(_)) { own } else { other };
                if i >= self.hands[from].len() {
                    return Err(DraftError::NoSuchCard(i));
                }
                let card = self.hands[from].remove(i);
                self.decks[own].push(card);
            }
            DraftMove::Swap { steal, discard } => {
                if !deck_full {
                    return Err(DraftError::DeckNotFull);
                }
                if steal >= self.hands[other].len() {
                    return Err(DraftError::NoSuchCard(steal));
                }
                if discard >= self.decks[own].len() {
                    return Err(DraftError::NoSuchCard(discard));
                }
                let card = self.hands[other].remove(steal);
                self.decks[own].remove(discard);
                self.decks[own].push(card);
            }
            DraftMove::Pass => {}
        }

        self.turns_taken += 1;
        if !self.is_complete() {
            self.turn = side.opponent();
        }
        Ok(())
    }

    /// Greedy choice for `side`
    pub fn greedy_move(&self, side: Owner) -> DraftMove {
        let own_hand = self.hand(side);
        let other_hand = self.hand(side.opponent());
        let deck = self.deck(side);

        if deck.len() >= DECK_SIZE {
            let best = first_max(&other_hand);
            let worst = deck
                .iter()
                .enumerate()
                .map(|(i, c)| (i, card_score(c)))
                .fold(None, |acc: Option<(usize, i32)>, (i, s)| match acc {
                    Some((_, w)) if w <= s => acc,
                    _ => Some((i, s)),
                });
            return match (best, worst) {
                (Some((steal, s)), Some((discard, w))) if s > w + SWAP_MARGIN => DraftMove::Swap { steal, discard },
                _ => DraftMove::Pass,
            };
        }

        let window = TurnWindow::from_turn(self.turns_taken + 1);
        let steal = first_max(&other_hand);
        let retain = first_max(&own_hand);

        match (steal, retain) {
            (Some((s, steal_score)), Some((_, retain_score)))
                if steal_score as f32 > retain_score as f32 * STEAL_RATIO
                    && worth_stealing(card_value(other_hand[s]), window) =>
            {
                DraftMove::Steal(s)
            }
            (_, Some((r, _))) => DraftMove::Retain(r),
            (Some((s, _)), None) => DraftMove::Steal(s),
            (None, None) => DraftMove::Pass,
        }
    }

    /// Play the draft out with the greedy policy on both sides
    pub fn run_greedy(&mut self) -> Vec<(Owner, DraftMove)> {
        let mut log = Vec::new();
        let mut passes = 0;

        while !self.is_complete() && passes < 2 {
            let side = self.turn;
            let mv = self.greedy_move(side);
            debug!(?side, ?mv, turn = self.turns_taken + 1, "draft decision");
            if self.apply(side, mv).is_err() {
                break;
            }
            passes = if mv == DraftMove::Pass { passes + 1 } else { 0 };
            log.push((side, mv));
        }

        log
    }

    /// Units for the placement phase
    pub fn final_decks(&self) -> (Vec<Unit>, Vec<Unit>) {
        let build = |side: Owner| self.deck(side).into_iter().map(|c| c.to_unit(side)).collect();
        (build(Owner::Player), build(Owner::Enemy))
    }
}

/// Fresh-card value used for the steal timing gate
fn card_value(card: &CardDef) -> f32 {
    let avg_dmg = if card.attacks.is_empty() {
        0.0
    } else {
        card.attacks.iter().map(|a| a.damage).sum::<i32>() as f32 / card.attacks.len() as f32
    };
    50.0 + avg_dmg * 2.0
}

/// Index and score of the first highest scoring card
fn first_max(cards: &[&CardDef]) -> Option<(usize, i32)> {
    cards
        .iter()
        .enumerate()
        .map(|(i, c)| (i, card_score(c)))
        .fold(None, |acc: Option<(usize, i32)>, (i, s)| match acc {
            Some((_, b)) if b >= s => acc,
            _ => Some((i, s)),
        })
}
