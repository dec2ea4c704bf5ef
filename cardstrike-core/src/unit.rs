//! Units, attacks and their static properties

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combat::{absorb_hit, Hit};

// ============================================================================
// OWNERSHIP AND ELEMENTS
// ============================================================================

/// Side a unit fights for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Player,
    Enemy,
}

impl Owner {
    pub fn opponent(self) -> Self {
        match self {
            Owner::Player => Owner::Enemy,
            Owner::Enemy => Owner::Player,
        }
    }
}

/// Elemental affinity of a unit or attack
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Water,
    Leaf,
    #[serde(alias = "wind")]
    Air,
    #[default]
    Null,
    Combined,
}

impl Element {
    pub fn name(self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Leaf => "leaf",
            Element::Air => "air",
            Element::Null => "null",
            Element::Combined => "combined",
        }
    }
}

/// Rarity tier, scales outgoing damage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Normal,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn damage_multiplier(self) -> f32 {
        match self {
            Rarity::Normal => 1.0,
            Rarity::Rare => 1.1,
            Rarity::Epic => 1.25,
            Rarity::Legendary => 1.5,
        }
    }
}

// ============================================================================
// ATTACKS
// ============================================================================

/// How an attack resolves on the board
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackEffect {
    /// Single target hit, never hurts allies
    #[default]
    Direct,
    /// Row of burning tiles toward the target plus a reduced hit
    Trail,
    /// Plus-shaped zone: regen for allies, burn for enemies
    CrossSupport,
    /// Same as `CrossSupport` over the 8 surrounding cells, stronger ticks
    FusionSupport,
}

/// Attack definition, shared read-only between a unit and its snapshots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    pub dmg: i32,
    pub element: Element,
    /// Inclusive Manhattan range
    pub range: i32,
    /// Opaque tag for the rendering layer
    pub animation: String,
    pub effect: AttackEffect,
    /// Support attacks are never considered as offensive options by the AI
    pub is_support: bool,
}

impl Attack {
    pub fn new(name: &str, dmg: i32, element: Element, range: i32) -> Self {
        Self {
            name: name.to_string(),
            dmg,
            element,
            range,
            animation: format!("projectile_{}", element.name()),
            effect: AttackEffect::Direct,
            is_support: false,
        }
    }

    pub fn with_effect(mut self, effect: AttackEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_animation(mut self, animation: &str) -> Self {
        self.animation = animation.to_string();
        self
    }

    pub fn support(mut self) -> Self {
        self.is_support = true;
        self
    }

    pub fn covers(&self, distance: i32) -> bool {
        distance <= self.range
    }
}

// ============================================================================
// UNITS
// ============================================================================

/// Stable identity of a placed unit, assigned by the board
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// A combatant on the board
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    pub owner: Owner,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub element: Element,
    pub rarity: Rarity,
    pub move_range: u32,
    pub shield: i32,
    pub attacks: Arc<[Attack]>,
    /// Set once a support attack has registered regen on this unit
    pub healed_once: bool,
}

impl Unit {
    /// Factory used by placement and draft: full hp, no shield, normal rarity
    pub fn new(
        owner: Owner,
        name: &str,
        hp: i32,
        attacks: Vec<Attack>,
        move_range: u32,
        element: Element,
    ) -> Self {
        Self {
            id: UnitId::default(),
            owner,
            name: name.to_string(),
            hp,
            max_hp: hp,
            element,
            rarity: Rarity::Normal,
            move_range,
            shield: 0,
            attacks: attacks.into(),
            healed_once: false,
        }
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_shield(mut self, shield: i32) -> Self {
        self.shield = shield.max(0);
        self
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp.clamp(0, self.max_hp);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hp_ratio(&self) -> f32 {
        self.hp as f32 / self.max_hp.max(1) as f32
    }

    /// Attacks the AI may use offensively
    pub fn offensive_attacks(&self) -> impl Iterator<Item = (usize, &Attack)> + '_ {
        self.attacks.iter().enumerate().filter(|(_, a)| !a.is_support)
    }

    /// Strongest offensive attack by base damage, first one on ties
    pub fn best_attack(&self) -> Option<&Attack> {
        self.offensive_attacks()
            .map(|(_, a)| a)
            .fold(None, |best: Option<&Attack>, a| match best {
                Some(b) if b.dmg >= a.dmg => Some(b),
                _ => Some(a),
            })
    }

    pub fn max_attack_range(&self) -> Option<i32> {
        self.attacks.iter().map(|a| a.range).max()
    }

    /// Apply damage through the shield first
    pub fn take_hit(&mut self, damage: i32) -> Hit {
        absorb_hit(&mut self.shield, &mut self.hp, damage)
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Damage that bypasses the shield (burning ground, burn ticks)
    pub fn suffer(&mut self, amount: i32) {
        self.hp = (self.hp - amount).max(0);
    }
}
