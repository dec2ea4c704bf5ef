//! Attack resolution on the live board
//!
//! One entry point, [`resolve_attack`], dispatches on the attack's
//! [`AttackEffect`]:
//! - `Direct`: single target, jittered and rarity-scaled, capped at a
//!   fraction of the target's max hp, never against allies
//! - `Trail`: burning tiles along the attacker's row plus a half hit
//! - `CrossSupport` / `FusionSupport`: regen for allies (once per unit
//!   lifetime), burn for enemies
//!
//! Rejected actions (out of range, missing attacker, ally or empty target
//! for a direct hit) are silent no-ops returning `None`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Pos};
use crate::config::RulesConfig;
use crate::effects::EffectLedger;
use crate::unit::{Attack, AttackEffect, Element, Owner, Rarity};

/// Outcome of applying damage to a shielded unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    /// Damage soaked by the shield
    pub absorbed: i32,
    /// Damage that reached hp
    pub dealt: i32,
}

/// Kind of a resolved action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Attack,
    Move,
}

/// Emitted once per resolved action for the rendering layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub kind: ActionKind,
    pub source: Pos,
    pub target: Option<Pos>,
    pub element: Option<Element>,
    /// Immediate hp damage dealt (after the shield)
    pub damage: i32,
    pub absorbed: i32,
    pub unit_died: bool,
    /// Flame tiles placed or regen/burn entries registered
    pub effects_registered: usize,
}

impl ResolvedEvent {
    pub fn movement(from: Pos, to: Pos) -> Self {
        Self {
            kind: ActionKind::Move,
            source: from,
            target: Some(to),
            element: None,
            damage: 0,
            absorbed: 0,
            unit_died: false,
            effects_registered: 0,
        }
    }

    fn attack(source: Pos, target: Pos, element: Element) -> Self {
        Self {
            kind: ActionKind::Attack,
            source,
            target: Some(target),
            element: Some(element),
            damage: 0,
            absorbed: 0,
            unit_died: false,
            effects_registered: 0,
        }
    }
}

// ============================================================================
// DAMAGE FORMULA
// ============================================================================

/// Damage of a direct hit.
///
/// `round((dmg + jitter - distance) * rarity)`, clamped to
/// `[1, floor(target_max_hp * cap_fraction)]`. Shared by real resolution
/// and the search simulation, which passes zero jitter.
pub fn hit_damage(
    attack: &Attack,
    rarity: Rarity,
    distance: i32,
    jitter: i32,
    target_max_hp: i32,
    cap_fraction: f32,
) -> i32 {
    let base = attack.dmg + jitter - distance;
    let scaled = (base as f32 * rarity.damage_multiplier()).round() as i32;
    let cap = (target_max_hp as f32 * cap_fraction).floor() as i32;
    scaled.min(cap).max(1)
}

/// Immediate hit of a trail attack: half of `dmg - distance` after the cap,
/// at least 1. Rarity and jitter do not apply.
pub fn trail_hit_damage(attack: &Attack, distance: i32, target_max_hp: i32, cap_fraction: f32) -> i32 {
    let cap = ((target_max_hp as f32 * cap_fraction).floor() as i32).max(1);
    let base = (attack.dmg - distance).clamp(1, cap);
    (base / 2).max(1)
}

/// Shield soaks `min(shield, damage)`, the rest comes off hp (floored at 0)
pub fn absorb_hit(shield: &mut i32, hp: &mut i32, damage: i32) -> Hit {
    let damage = damage.max(0);
    let absorbed = (*shield).min(damage).max(0);
    *shield -= absorbed;
    let dealt = damage - absorbed;
    *hp = (*hp - dealt).max(0);
    Hit { absorbed, dealt }
}

pub fn roll_jitter<R: Rng>(rng: &mut R, jitter: i32) -> i32 {
    if jitter > 0 {
        rng.gen_range(-jitter..=jitter)
    } else {
        0
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Resolve one attack against the live board
pub fn resolve_attack<R: Rng>(
    board: &mut Board,
    ledger: &mut EffectLedger,
    rules: &RulesConfig,
    attacker_pos: Pos,
    target_pos: Pos,
    attack: &Attack,
    rng: &mut R,
) -> Option<ResolvedEvent> {
    let distance = attacker_pos.distance_to(target_pos);
    if distance > attack.range {
        return None;
    }
    let attacker = board.occupant(attacker_pos)?;
    let (owner, rarity) = (attacker.owner, attacker.rarity);

    let ctx = Strike { owner, rarity, attacker_pos, target_pos, distance, attack };
    match attack.effect {
        AttackEffect::Direct => resolve_direct(board, rules, &ctx, rng),
        AttackEffect::Trail => Some(resolve_trail(board, ledger, rules, &ctx)),
        AttackEffect::CrossSupport => {
            let zone = target_pos.plus_pattern();
            Some(resolve_support(board, ledger, &ctx, &zone, rules.cross_heal, rules.cross_burn, rules.support_ticks))
        }
        AttackEffect::FusionSupport => {
            let zone = target_pos.neighbors8();
            Some(resolve_support(board, ledger, &ctx, &zone, rules.fusion_heal, rules.fusion_burn, rules.support_ticks))
        }
    }
}

struct Strike<'a> {
    owner: Owner,
    rarity: Rarity,
    attacker_pos: Pos,
    target_pos: Pos,
    distance: i32,
    attack: &'a Attack,
}

fn resolve_direct<R: Rng>(
    board: &mut Board,
    rules: &RulesConfig,
    ctx: &Strike<'_>,
    rng: &mut R,
) -> Option<ResolvedEvent> {
    let target = board.occupant(ctx.target_pos)?;
    if target.owner == ctx.owner {
        return None;
    }

    let jitter = roll_jitter(rng, rules.jitter);
    let damage = hit_damage(
        ctx.attack,
        ctx.rarity,
        ctx.distance,
        jitter,
        target.max_hp,
        rules.direct_cap_fraction,
    );

    let mut event = ResolvedEvent::attack(ctx.attacker_pos, ctx.target_pos, ctx.attack.element);
    strike_unit(board, ctx.target_pos, damage, &mut event);
    Some(event)
}

fn resolve_trail(board: &mut Board, ledger: &mut EffectLedger, rules: &RulesConfig, ctx: &Strike<'_>) -> ResolvedEvent {
    let mut event = ResolvedEvent::attack(ctx.attacker_pos, ctx.target_pos, ctx.attack.element);

    let dc = if ctx.target_pos.col > ctx.attacker_pos.col { 1 } else { -1 };
    for step in 1..=rules.trail_length {
        let Some(pos) = ctx.attacker_pos.offset(dc * step, 0) else {
            break;
        };
        if board.in_bounds(pos)
            && ledger.add_flame_tile(pos, ctx.owner, rules.trail_damage, rules.trail_ticks)
        {
            event.effects_registered += 1;
        }
    }

    let target_max_hp = match board.occupant(ctx.target_pos) {
        Some(target) if target.owner != ctx.owner => target.max_hp,
        _ => return event,
    };

    let damage = trail_hit_damage(ctx.attack, ctx.distance, target_max_hp, rules.direct_cap_fraction);
    strike_unit(board, ctx.target_pos, damage, &mut event);
    event
}

fn resolve_support(
    board: &mut Board,
    ledger: &mut EffectLedger,
    ctx: &Strike<'_>,
    zone: &[Pos],
    heal: i32,
    burn: i32,
    ticks: i32,
) -> ResolvedEvent {
    let mut event = ResolvedEvent::attack(ctx.attacker_pos, ctx.target_pos, ctx.attack.element);

    for &pos in zone {
        let Some(unit) = board.occupant_mut(pos) else {
            continue;
        };
        if unit.owner == ctx.owner {
            if !unit.healed_once {
                unit.healed_once = true;
                ledger.register_regen(unit.id, heal, ticks);
                event.effects_registered += 1;
            }
        } else {
            ledger.register_burn(unit.id, burn, ticks);
            event.effects_registered += 1;
        }
    }

    event
}

/// Damage the unit at `pos`, vacating the cell if it dies
fn strike_unit(board: &mut Board, pos: Pos, damage: i32, event: &mut ResolvedEvent) {
    let Some(target) = board.occupant_mut(pos) else {
        return;
    };
    let hit = target.take_hit(damage);
    event.damage += hit.dealt;
    event.absorbed += hit.absorbed;
    if !target.is_alive() {
        board.remove(pos);
        event.unit_died = true;
    }
}
