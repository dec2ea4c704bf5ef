//! Shared setup for the commands: configuration, card pool and decks

use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cardstrike_core::roster::{enemy_card, player_card, random_enemy_deck};
use cardstrike_core::{Battle, BattleConfig, CardPool, Element, Owner, Unit};

/// Number of beasts in a random CPU deck
pub const DEFAULT_DECK_SIZE: usize = 3;

/// Create RNG from seed or random
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Load the battle configuration and apply command-line overrides
pub fn load_config(path: Option<&Path>, depth: Option<u32>, seed: Option<u64>) -> Result<BattleConfig> {
    let mut config = match path {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    if let Some(depth) = depth {
        config = config.with_depth(depth);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

pub fn load_pool(path: Option<&Path>) -> Result<CardPool> {
    match path {
        Some(path) => CardPool::load(path),
        None => CardPool::builtin(),
    }
}

fn parse_element(name: &str) -> Option<Element> {
    serde_json::from_value(serde_json::Value::String(name.to_lowercase())).ok()
}

/// Build a deck from element names or card names.
///
/// An empty list gives a random beast deck for the CPU side.
pub fn build_deck(names: &[String], owner: Owner, pool: &CardPool, rng: &mut ChaCha8Rng) -> Result<Vec<Unit>> {
    if names.is_empty() {
        if owner == Owner::Enemy {
            return Ok(random_enemy_deck(DEFAULT_DECK_SIZE, rng));
        }
        bail!("player deck is empty");
    }

    names
        .iter()
        .enumerate()
        .map(|(slot, name)| {
            if let Some(card) = pool.get(name) {
                return Ok(card.to_unit(owner));
            }
            let element = parse_element(name)
                .with_context(|| format!("'{}' is neither an element nor a card in the pool", name))?;
            Ok(match owner {
                Owner::Player => player_card(slot, element),
                Owner::Enemy => enemy_card(slot, element),
            })
        })
        .collect()
}

/// Battle with both decks placed on their halves of the board
pub fn new_battle(config: BattleConfig, player: Vec<Unit>, cpu: Vec<Unit>, search_player: bool) -> Result<Battle> {
    let mut battle = Battle::new(config);
    if search_player {
        battle = battle.with_player_search();
    }
    battle.place_deck(player).context("Failed to place player deck")?;
    battle.place_deck(cpu).context("Failed to place CPU deck")?;
    Ok(battle)
}
