//! Card definitions and unit factories
//!
//! Cards come from a JSON pool (`{"cards": [...]}`) or from the built-in
//! element decks. Attack behaviour is explicit on each definition; when a
//! pool entry leaves `effect` or `support` out, the legacy name-based
//! classification fills them in at load time and nowhere else.

use std::path::Path;

use anyhow::Context;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::unit::{Attack, AttackEffect, Element, Owner, Rarity, Unit};

/// Hit points of the built-in element cards
pub const STANDARD_HP: i32 = 100;
pub const PLAYER_MOVE_RANGE: u32 = 3;
pub const ENEMY_MOVE_RANGE: u32 = 2;

/// Elements the built-in decks are drawn from
pub const DECK_ELEMENTS: [Element; 4] = [Element::Fire, Element::Water, Element::Leaf, Element::Null];

const BUILTIN_POOL: &str = include_str!("../data/cards.json");

// ============================================================================
// DEFINITIONS
// ============================================================================

/// Attack entry of a card pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackDef {
    pub name: String,
    pub damage: i32,
    pub element: Element,
    pub range: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<AttackEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<bool>,
}

impl AttackDef {
    pub fn to_attack(&self) -> Attack {
        let mut attack = Attack::new(&self.name, self.damage, self.element, self.range)
            .with_effect(self.effect.unwrap_or_else(|| legacy_effect(&self.name)));
        if let Some(animation) = &self.animation {
            attack = attack.with_animation(animation);
        }
        let support = self
            .support
            .unwrap_or_else(|| legacy_is_heal(&self.name, &attack.animation));
        if support {
            attack = attack.support();
        }
        attack
    }
}

/// Card entry of a card pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDef {
    pub name: String,
    pub hp: i32,
    pub element: Element,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(rename = "move", default = "default_move")]
    pub move_range: u32,
    #[serde(default)]
    pub shield: i32,
    pub attacks: Vec<AttackDef>,
}

fn default_move() -> u32 {
    PLAYER_MOVE_RANGE
}

impl CardDef {
    /// Draft value of the card: hp plus total attack damage
    pub fn score(&self) -> i32 {
        self.hp + self.attacks.iter().map(|a| a.damage).sum::<i32>()
    }

    /// Build a unit ready for placement
    pub fn to_unit(&self, owner: Owner) -> Unit {
        let attacks = self.attacks.iter().map(AttackDef::to_attack).collect();
        Unit::new(owner, &self.name, self.hp, attacks, self.move_range, self.element)
            .with_rarity(self.rarity)
            .with_shield(self.shield)
    }
}

/// A set of draftable cards
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPool {
    pub cards: Vec<CardDef>,
}

impl CardPool {
    /// Load a pool from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read card pool: {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse card pool: {}", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let pool: CardPool = serde_json::from_str(json)?;
        if let Some(card) = pool.cards.iter().find(|c| c.hp <= 0 || c.attacks.is_empty()) {
            anyhow::bail!("card '{}' needs positive hp and at least one attack", card.name);
        }
        Ok(pool)
    }

    /// Pool shipped with the crate
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_POOL).context("Built-in card pool is invalid")
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CardDef> {
        self.cards.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// LEGACY CLASSIFICATION
// ============================================================================

/// Behaviour implied by an attack name in pools that predate `effect`
pub fn legacy_effect(name: &str) -> AttackEffect {
    match name {
        "Burning Trail" => AttackEffect::Trail,
        "Nature's Embrace" => AttackEffect::CrossSupport,
        "Burning-Embrace Fusion" => AttackEffect::FusionSupport,
        _ => AttackEffect::Direct,
    }
}

/// Heal attacks were recognised by "heal" in the name or animation tag
pub fn legacy_is_heal(name: &str, animation: &str) -> bool {
    name.to_lowercase().contains("heal") || animation.to_lowercase().contains("heal")
}

// ============================================================================
// ELEMENT DECKS
// ============================================================================

/// The three attacks of a built-in element card
pub fn standard_attacks(element: Element) -> Vec<Attack> {
    match element {
        Element::Fire => vec![
            Attack::new("Burning Trail", 12, Element::Fire, 5).with_effect(AttackEffect::Trail),
            Attack::new("Fire Claw", 14, Element::Fire, 4),
            Attack::new("Inferno Burst", 16, Element::Fire, 5),
        ],
        Element::Water => vec![
            Attack::new("Water Lash", 10, Element::Water, 5),
            Attack::new("Tidal Push", 12, Element::Water, 4),
            Attack::new("Healing Wave", 8, Element::Water, 4).support(),
        ],
        Element::Leaf => vec![
            Attack::new("Nature's Embrace", 10, Element::Leaf, 4).with_effect(AttackEffect::CrossSupport),
            Attack::new("Vine Whip", 12, Element::Leaf, 5),
            Attack::new("Thorn Burst", 14, Element::Leaf, 4),
        ],
        _ => vec![
            Attack::new("Strike", 12, Element::Null, 4),
            Attack::new("Guard Break", 14, Element::Null, 4),
            Attack::new("Focused Blow", 16, Element::Null, 3),
        ],
    }
}

/// Built-in hero for deck slot `slot`
pub fn player_card(slot: usize, element: Element) -> Unit {
    Unit::new(
        Owner::Player,
        &format!("Hero {}", slot + 1),
        STANDARD_HP,
        standard_attacks(element),
        PLAYER_MOVE_RANGE,
        deck_element(element),
    )
}

/// Built-in CPU beast for deck slot `slot`
pub fn enemy_card(slot: usize, element: Element) -> Unit {
    Unit::new(
        Owner::Enemy,
        &format!("Beast {}", slot + 1),
        STANDARD_HP,
        standard_attacks(element),
        ENEMY_MOVE_RANGE,
        deck_element(element),
    )
}

/// Elements without a deck of their own play the null deck
fn deck_element(element: Element) -> Element {
    if DECK_ELEMENTS.contains(&element) {
        element
    } else {
        Element::Null
    }
}

pub fn random_element<R: Rng>(rng: &mut R) -> Element {
    *DECK_ELEMENTS.choose(rng).unwrap_or(&Element::Null)
}

/// `size` beasts with random elements
pub fn random_enemy_deck<R: Rng>(size: usize, rng: &mut R) -> Vec<Unit> {
    (0..size).map(|slot| enemy_card(slot, random_element(rng))).collect()
}
