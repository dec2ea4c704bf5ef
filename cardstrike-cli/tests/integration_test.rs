//! Integration tests for the Card Strike engine
//!
//! Tests the full stack: rules engine, effect ledger, minimax search,
//! the draft and headless battles

use cardstrike_core::{
    board::Pos,
    combat::resolve_attack,
    roster::{enemy_card, player_card},
    unit::{Attack, AttackEffect, Element, Owner, Rarity, Unit, UnitId},
    Battle, BattleConfig, BattleStatus, Board, CardPool, DraftState, EffectLedger, EvalWeights,
    MinimaxAI, RulesConfig, SearchConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn strike(dmg: i32, range: i32) -> Attack {
    Attack::new("Strike", dmg, Element::Null, range)
}

fn burning_trail() -> Attack {
    Attack::new("Burning Trail", 12, Element::Fire, 5).with_effect(AttackEffect::Trail)
}

fn embrace() -> Attack {
    Attack::new("Nature's Embrace", 10, Element::Leaf, 4).with_effect(AttackEffect::CrossSupport)
}

/// Unit with 40 max hp
fn fighter(owner: Owner, hp: i32, attacks: Vec<Attack>) -> Unit {
    Unit::new(owner, "fighter", 40, attacks, 2, Element::Null).with_hp(hp)
}

fn search_ai(depth: u32, prune: bool) -> MinimaxAI {
    let search = SearchConfig { depth, prune, ..SearchConfig::default() };
    MinimaxAI::new(search, EvalWeights::default(), RulesConfig::default())
}

/// Two against two with mixed ranges
fn skirmish_board() -> Board {
    let mut board = Board::new(10, 6);
    board.place(Pos::new(2, 2), fighter(Owner::Enemy, 40, vec![strike(12, 3), strike(16, 1)])).unwrap();
    board.place(Pos::new(3, 4), fighter(Owner::Enemy, 25, vec![strike(10, 4)])).unwrap();
    board.place(Pos::new(5, 2), fighter(Owner::Player, 30, vec![strike(14, 3)])).unwrap();
    board.place(Pos::new(6, 4), fighter(Owner::Player, 40, vec![strike(12, 2)])).unwrap();
    board
}

// ============================================================================
// RULES ENGINE
// ============================================================================

#[test]
fn test_direct_hit_within_cap_and_floor() {
    let rules = RulesConfig::default();
    for seed in 0..64 {
        let mut board = Board::new(5, 5);
        board.place(Pos::new(0, 0), fighter(Owner::Enemy, 40, vec![strike(12, 3)])).unwrap();
        board.place(Pos::new(0, 3), fighter(Owner::Player, 40, vec![strike(5, 1)])).unwrap();
        let mut ledger = EffectLedger::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let event = resolve_attack(&mut board, &mut ledger, &rules, Pos::new(0, 0), Pos::new(0, 3), &strike(12, 3), &mut rng)
            .unwrap();

        // 12 +/- 2 - 3 lies inside [1, 10] and 10 is a quarter of 40
        assert!((1..=10).contains(&event.damage), "seed {seed}: damage {}", event.damage);
        assert_eq!(board.occupant(Pos::new(0, 3)).unwrap().hp, 40 - event.damage);
    }
}

#[test]
fn test_legendary_hit_still_capped() {
    let rules = RulesConfig::default();
    for seed in 0..32 {
        let mut board = Board::new(5, 5);
        let attacker = fighter(Owner::Enemy, 40, vec![strike(30, 2)]).with_rarity(Rarity::Legendary);
        board.place(Pos::new(1, 1), attacker).unwrap();
        board.place(Pos::new(1, 2), fighter(Owner::Player, 40, vec![strike(5, 1)])).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let event = resolve_attack(&mut board, &mut EffectLedger::new(), &rules, Pos::new(1, 1), Pos::new(1, 2), &strike(30, 2), &mut rng)
            .unwrap();
        assert_eq!(event.damage, 10);
    }
}

#[test]
fn test_no_friendly_fire() {
    let rules = RulesConfig::default();
    let mut board = Board::new(5, 5);
    board.place(Pos::new(0, 0), fighter(Owner::Player, 40, vec![strike(12, 3)])).unwrap();
    board.place(Pos::new(0, 1), fighter(Owner::Player, 40, vec![strike(12, 3)])).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let event = resolve_attack(&mut board, &mut EffectLedger::new(), &rules, Pos::new(0, 0), Pos::new(0, 1), &strike(12, 3), &mut rng);
    assert!(event.is_none());
    assert_eq!(board.occupant(Pos::new(0, 1)).unwrap().hp, 40);
}

#[test]
fn test_out_of_range_is_noop() {
    let rules = RulesConfig::default();
    let mut board = Board::new(8, 3);
    board.place(Pos::new(0, 0), fighter(Owner::Enemy, 40, vec![strike(12, 3)])).unwrap();
    board.place(Pos::new(4, 0), fighter(Owner::Player, 40, vec![strike(12, 3)])).unwrap();
    let mut ledger = EffectLedger::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert!(resolve_attack(&mut board, &mut ledger, &rules, Pos::new(0, 0), Pos::new(4, 0), &strike(12, 3), &mut rng).is_none());
    assert!(resolve_attack(&mut board, &mut ledger, &rules, Pos::new(0, 0), Pos::new(7, 0), &burning_trail(), &mut rng).is_none());
    assert!(ledger.is_empty());
    assert_eq!(board.occupant(Pos::new(4, 0)).unwrap().hp, 40);
}

#[test]
fn test_shield_absorbs_first() {
    let rules = RulesConfig::default();
    for seed in 0..32 {
        let mut board = Board::new(5, 5);
        board.place(Pos::new(2, 1), fighter(Owner::Enemy, 40, vec![strike(12, 3)])).unwrap();
        board.place(Pos::new(2, 2), fighter(Owner::Player, 40, vec![strike(5, 1)]).with_shield(5)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let event = resolve_attack(&mut board, &mut EffectLedger::new(), &rules, Pos::new(2, 1), Pos::new(2, 2), &strike(12, 3), &mut rng)
            .unwrap();
        let target = board.occupant(Pos::new(2, 2)).unwrap();

        // Raw hit is 9..=10, more than the shield holds
        assert_eq!(event.absorbed, 5);
        assert!((9..=10).contains(&(event.damage + event.absorbed)));
        assert_eq!(target.shield, 0);
        assert_eq!(target.hp, 40 - event.damage);
    }
}

#[test]
fn test_trail_scenario() {
    let rules = RulesConfig::default();
    let mut board = Board::default();
    board.place(Pos::new(2, 2), fighter(Owner::Enemy, 40, vec![burning_trail()])).unwrap();
    let mut ledger = EffectLedger::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let event = resolve_attack(&mut board, &mut ledger, &rules, Pos::new(2, 2), Pos::new(5, 2), &burning_trail(), &mut rng)
        .unwrap();
    assert_eq!(event.effects_registered, 5);
    for (tile, col) in ledger.flame_tiles().iter().zip(3..=7) {
        assert_eq!(tile.pos, Pos::new(col, 2));
        assert_eq!(tile.owner, Owner::Enemy);
    }

    // Player steps onto column 3 next turn
    board.place(Pos::new(3, 2), fighter(Owner::Player, 40, vec![strike(5, 1)])).unwrap();
    let mut hp = vec![];
    while !ledger.flame_tiles().is_empty() {
        ledger.tick(&mut board);
        hp.push(board.occupant(Pos::new(3, 2)).unwrap().hp);
    }
    assert_eq!(hp, vec![35, 30, 30]);
}

#[test]
fn test_support_heals_each_ally_once() {
    let rules = RulesConfig::default();
    let mut board = Board::new(8, 8);
    board.place(Pos::new(1, 2), fighter(Owner::Player, 40, vec![embrace()])).unwrap();
    board.place(Pos::new(3, 3), fighter(Owner::Player, 20, vec![strike(5, 1)])).unwrap();
    board.place(Pos::new(3, 4), fighter(Owner::Enemy, 40, vec![strike(5, 1)])).unwrap();
    let mut ledger = EffectLedger::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    for _ in 0..3 {
        resolve_attack(&mut board, &mut ledger, &rules, Pos::new(1, 2), Pos::new(3, 3), &embrace(), &mut rng).unwrap();
    }

    assert_eq!(ledger.regen_entries().len(), 1);
    assert_eq!(ledger.burn_entries().len(), 3);
    assert!(board.occupant(Pos::new(3, 3)).unwrap().healed_once);
    // Enemies are never healed and allies never burned
    assert!(!board.occupant(Pos::new(3, 4)).unwrap().healed_once);
    assert_eq!(board.occupant(Pos::new(3, 3)).unwrap().hp, 20);
}

// ============================================================================
// BOARD AND LEDGER
// ============================================================================

#[test]
fn test_reachability() {
    let mut board = Board::new(5, 1);
    board.place(Pos::new(1, 0), fighter(Owner::Enemy, 40, vec![strike(5, 1)])).unwrap();

    let zero = board.reachable(Pos::new(3, 0), 0);
    assert_eq!(zero.len(), 1);
    assert!(zero.contains(&Pos::new(3, 0)));

    // Walled in by the unit at column 1
    let walled = board.reachable(Pos::new(0, 0), 4);
    assert_eq!(walled.len(), 1);
    assert!(walled.contains(&Pos::new(0, 0)));
}

#[test]
fn test_tick_on_dead_target_drops_entry() {
    let mut board = Board::new(4, 4);
    board.place(Pos::new(1, 1), fighter(Owner::Player, 30, vec![strike(5, 1)])).unwrap();
    let doomed = board.place(Pos::new(2, 2), fighter(Owner::Enemy, 30, vec![strike(5, 1)])).unwrap();

    let mut ledger = EffectLedger::new();
    ledger.register_regen(UnitId(999), 5, 3);
    ledger.register_burn(doomed, 8, 3);
    board.remove(Pos::new(2, 2));

    let events = ledger.tick(&mut board);
    assert!(events.is_empty());
    assert!(ledger.is_empty());
    assert_eq!(board.occupant(Pos::new(1, 1)).unwrap().hp, 30);
}

// ============================================================================
// SEARCH
// ============================================================================

#[test]
fn test_depth_two_takes_lethal_shot() {
    let mut board = Board::new(10, 6);
    board.place(Pos::new(2, 2), fighter(Owner::Enemy, 40, vec![strike(12, 3)])).unwrap();
    board.place(Pos::new(4, 2), fighter(Owner::Player, 5, vec![strike(12, 3)])).unwrap();
    board.place(Pos::new(9, 5), fighter(Owner::Player, 40, vec![strike(12, 1)])).unwrap();

    let config = BattleConfig::default().with_board_size(10, 6).with_depth(2).with_seed(11);
    let mut battle = Battle::with_board(board, config);
    let event = battle.decide_and_apply().unwrap();

    assert_eq!(event.target, Some(Pos::new(4, 2)));
    assert!(event.unit_died);
    assert!(battle.board().is_empty(Pos::new(4, 2)));
}

#[test]
fn test_pruned_search_matches_exhaustive() {
    let board = skirmish_board();
    for depth in 1..=3 {
        let pruned = search_ai(depth, true).search(&board).unwrap();
        let full = search_ai(depth, false).search(&board).unwrap();
        assert_eq!(pruned.score, full.score, "depth {depth}");
        assert!(pruned.stats.nodes <= full.stats.nodes);
    }
}

// ============================================================================
// FULL STACK
// ============================================================================

#[test]
fn test_seeded_battle_is_reproducible() {
    let play = || {
        let mut battle = Battle::new(BattleConfig::default().with_seed(5));
        battle.place_deck((0..3).map(|i| player_card(i, Element::Fire)).collect()).unwrap();
        battle
            .place_deck(vec![enemy_card(0, Element::Water), enemy_card(1, Element::Leaf), enemy_card(2, Element::Null)])
            .unwrap();
        battle.run(40)
    };

    let a = play();
    let b = play();
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    assert!(a.turns <= 40);
    if a.status == BattleStatus::Victory {
        assert_eq!(a.enemy_units, 0);
    }
}

#[test]
fn test_draft_then_battle() {
    let pool = CardPool::builtin().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let mut draft = DraftState::deal(&pool, &mut rng).unwrap();
    draft.run_greedy();
    assert!(draft.is_complete());

    let (player, cpu) = draft.final_decks();
    assert!(player.iter().all(|u| u.owner == Owner::Player));
    assert!(cpu.iter().all(|u| u.owner == Owner::Enemy));

    let mut battle = Battle::new(BattleConfig::default().with_seed(21));
    battle.place_deck(player).unwrap();
    battle.place_deck(cpu).unwrap();
    let report = battle.run(60);

    assert!(report.turns <= 60);
    match report.status {
        BattleStatus::Victory => assert_eq!(report.enemy_units, 0),
        BattleStatus::Defeat => assert_eq!(report.player_units, 0),
        BattleStatus::Ongoing => assert!(report.player_units > 0 && report.enemy_units > 0),
    }
}
