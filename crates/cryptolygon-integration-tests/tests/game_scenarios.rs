//! End-to-end game scenarios through the full deployment: proxy, cut,
//! gameplay modules, token and catalog.

use cryptolygon_core::cut::ModuleCut;
use cryptolygon_core::error::{CallError, ErrorCategory};
use cryptolygon_core::id::{Address, Env, Selector};
use cryptolygon_core::module::Module;
use cryptolygon_core::test_utils::{addr, owner};
use cryptolygon_core::token::TokenError;
use cryptolygon_economy::augmentation::{AugmentationModule, BUY_UPGRADES};
use cryptolygon_economy::config::DEFAULT_SCALE_FACTOR;
use cryptolygon_economy::events::GameEvent;
use cryptolygon_economy::player::PlayerView;
use cryptolygon_economy::production::{LEVEL_UP, ProductionModule};
use cryptolygon_economy::{Batch, GameClient, GameConfig, deploy_game};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ===========================================================================
// Helpers
// ===========================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn game() -> GameClient {
    init_tracing();
    deploy_game(owner(), GameConfig::default(), 0)
        .unwrap()
        .into_client()
}

fn alice() -> Address {
    addr(0xA11CE)
}

fn bob() -> Address {
    addr(0xB0B)
}

fn at(player: Address, timestamp: u64) -> Env {
    Env::new(player, timestamp)
}

fn view(game: &mut GameClient, player: Address, timestamp: u64) -> PlayerView {
    game.get_player(at(addr(999), timestamp), player)
        .unwrap()
        .unwrap()
}

// ===========================================================================
// Production
// ===========================================================================

#[test]
fn hour_of_production_then_level_up() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();

    let before = view(&mut game, alice(), 3_600);
    assert_eq!(before.pending_lines, 7_200);

    let cost = game.level_up(at(alice(), 3_600), Batch::single(0, 2)).unwrap();
    assert_eq!(cost, 6);

    let after = view(&mut game, alice(), 3_600);
    assert_eq!(after.record.lines, 7_194);
    assert_eq!(after.record.run_lines, 7_200);
    assert_eq!(after.record.polygon_levels, vec![3]);
    assert_eq!(after.record.total_polygon_levels, 3);
    assert_eq!(after.rate, 6);
    assert_eq!(after.pending_lines, 0);
}

#[test]
fn out_of_range_tier_leaves_player_untouched() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    let revision = game.proxy().storage().revision();

    let result = game.level_up(at(alice(), 3_600), Batch::new(vec![0, 7], vec![1, 1]));
    assert!(matches!(result, Err(CallError::InvalidArguments(_))));
    assert_eq!(result.unwrap_err().category(), ErrorCategory::Validation);

    // Even the accrual the call performed is gone.
    let record = view(&mut game, alice(), 3_600).record;
    assert_eq!(record.lines, 0);
    assert_eq!(record.last_accrual, 0);
    assert_eq!(record.polygon_levels, vec![1]);
    assert_eq!(game.proxy().storage().revision(), revision);
}

#[test]
fn tiers_cannot_be_skipped() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    for tier in 2..7 {
        assert_eq!(
            game.level_up(at(alice(), 1_000_000), Batch::single(tier, 1)),
            Err(CallError::PolygonLevelUpNotAllowed {
                tier,
                required: tier - 1
            })
        );
    }
    // Unlocking tier 1 in the same batch does not allow tier 2.
    assert!(matches!(
        game.level_up(at(alice(), 1_000_000), Batch::new(vec![1, 2], vec![1, 1])),
        Err(CallError::PolygonLevelUpNotAllowed { tier: 2, .. })
    ));

    game.level_up(at(alice(), 1_000_000), Batch::single(1, 1)).unwrap();
    game.level_up(at(alice(), 1_000_000), Batch::single(2, 1)).unwrap();
    assert_eq!(
        view(&mut game, alice(), 1_000_000).record.polygon_levels,
        vec![1, 1, 1]
    );
}

#[test]
fn insufficient_lines_is_resource_error() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    let result = game.level_up(at(alice(), 5), Batch::single(1, 1));
    assert_eq!(
        result,
        Err(CallError::NotEnoughLinesToLevelUp {
            required: 20,
            available: 10
        })
    );
    assert_eq!(result.unwrap_err().category(), ErrorCategory::Resource);
}

#[test]
fn batch_cost_is_summed_before_one_balance_check() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    // 30 lines at t=15. Tier 0 by 2 costs 6, tier 1 by 1 costs 20.
    let cost = game
        .level_up(at(alice(), 15), Batch::new(vec![0, 1], vec![2, 1]))
        .unwrap();
    assert_eq!(cost, 26);
    assert_eq!(view(&mut game, alice(), 15).record.lines, 4);

    // Rate is now 3×2 + 5, so 15 lines at t=16 against 24 + 40.
    let result = game.level_up(at(alice(), 16), Batch::new(vec![0, 1], vec![2, 1]));
    assert_eq!(
        result,
        Err(CallError::NotEnoughLinesToLevelUp {
            required: 64,
            available: 15
        })
    );
}

// ===========================================================================
// Augmentation
// ===========================================================================

#[test]
fn upgrades_multiply_production() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    let cost = game
        .buy_upgrades(at(alice(), 10), Batch::new(vec![0, 1], vec![1, 1]))
        .unwrap();
    assert_eq!(cost, 2);
    // 2 × (1 + 1 + 1)
    assert_eq!(game.production_rate(at(alice(), 10), alice()).unwrap(), 6);
    let before = view(&mut game, alice(), 20);
    assert_eq!(before.pending_lines, 60);

    // The affordable line does not go through on its own.
    assert_eq!(
        game.buy_upgrades(at(alice(), 20), Batch::new(vec![0, 2], vec![1, 1])),
        Err(CallError::NotEnoughLinesToBuyUpgrade {
            required: 1_002,
            available: 78
        })
    );
    let after = view(&mut game, alice(), 20);
    assert_eq!(after, before);
    assert_eq!(after.record.lines, 18);
    assert_eq!(after.record.upgrade_level(0), 1);
    assert_eq!(after.record.upgrade_level(2), 0);
}

// ===========================================================================
// Prestige
// ===========================================================================

#[test]
fn ascension_awards_log_of_run_and_resets() {
    let mut game = game();
    game.start(at(bob(), 0)).unwrap();
    let t = 1u64 << 40;

    // 2^41 lines: floor(41 − 35) = 6 points.
    let preview = game.ascension_award(at(bob(), t), bob()).unwrap();
    assert_eq!(preview, 6 * DEFAULT_SCALE_FACTOR);
    let award = game.ascend(at(bob(), t)).unwrap();
    assert_eq!(award, preview);
    assert_eq!(game.circles(bob()), award);

    let record = view(&mut game, bob(), t).record;
    assert_eq!(record.polygon_levels, vec![1]);
    assert_eq!(record.run_lines, 0);
    assert_eq!(record.lines, 0);
    assert_eq!(record.lifetime_lines, 1 << 41);
    assert_eq!(record.ascension_count, 1);
    assert_eq!(record.last_accrual, t);

    assert!(game.events().contains(&GameEvent::Ascended {
        player: bob(),
        run_lines: 1 << 41,
        award,
        ascension_count: 1,
    }));
}

#[test]
fn small_run_ascends_for_nothing() {
    let mut game = game();
    game.start(at(bob(), 0)).unwrap();
    game.level_up(at(bob(), 100), Batch::single(0, 3)).unwrap();
    assert_eq!(game.ascend(at(bob(), 200)).unwrap(), 0);
    assert_eq!(game.proxy().token().total_supply(), 0);
    let record = view(&mut game, bob(), 200).record;
    assert_eq!(record.polygon_levels, vec![1]);
    assert_eq!(record.ascension_count, 1);
}

#[test]
fn perks_survive_ascension_and_boost_the_next_run() {
    let mut game = game();
    game.start(at(bob(), 0)).unwrap();
    let t1 = 1u64 << 40;
    game.ascend(at(bob(), t1)).unwrap();
    assert_eq!(game.circles(bob()), 6 * DEFAULT_SCALE_FACTOR);

    // Perk 0 from level 0 by 2: 1 × (1 + 2) × scale.
    assert_eq!(game.perk_cost(at(bob(), t1), 0, 0, 2).unwrap(), 3 * DEFAULT_SCALE_FACTOR);
    let burned = game.buy_perks(at(bob(), t1), Batch::single(0, 2)).unwrap();
    assert_eq!(burned, 3 * DEFAULT_SCALE_FACTOR);
    assert_eq!(game.circles(bob()), 3 * DEFAULT_SCALE_FACTOR);
    assert_eq!(game.production_rate(at(bob(), t1), bob()).unwrap(), 6);

    // Perk 2 costs 10^10 × scale; perk 0 by 1 more would cost 3 × scale.
    let before = view(&mut game, bob(), t1);
    let supply = game.proxy().token().total_supply();
    assert_eq!(
        game.buy_perks(at(bob(), t1), Batch::new(vec![0, 2], vec![1, 1])),
        Err(CallError::Token(TokenError::InsufficientBalance {
            required: (10_000_000_000 + 3) * DEFAULT_SCALE_FACTOR,
            available: 3 * DEFAULT_SCALE_FACTOR,
        }))
    );
    let after = view(&mut game, bob(), t1);
    assert_eq!(after, before);
    assert_eq!(after.record.perk_level(0), 2);
    assert_eq!(after.record.perk_level(2), 0);
    assert_eq!(game.circles(bob()), 3 * DEFAULT_SCALE_FACTOR);
    assert_eq!(game.proxy().token().total_supply(), supply);

    // Second run: 6 × 2^40 lines on top of 2^41 earlier reaches 2^43.
    let t2 = t1 + (1u64 << 40);
    let award = game.ascend(at(bob(), t2)).unwrap();
    assert_eq!(award, 2 * DEFAULT_SCALE_FACTOR);

    let record = view(&mut game, bob(), t2).record;
    assert_eq!(record.perk_level(0), 2);
    assert_eq!(record.lifetime_lines, 1 << 43);
    assert_eq!(record.ascension_count, 2);
}

#[test]
fn circles_are_transferable_after_minting() {
    let mut game = game();
    game.start(at(bob(), 0)).unwrap();
    game.ascend(at(bob(), 1 << 40)).unwrap();
    game.proxy_mut()
        .token_mut()
        .transfer(bob(), alice(), DEFAULT_SCALE_FACTOR)
        .unwrap();
    assert_eq!(game.circles(alice()), DEFAULT_SCALE_FACTOR);

    // Only the proxy may mint.
    let result = game.proxy_mut().token_mut().mint(bob(), bob(), 1);
    assert_eq!(result, Err(TokenError::Unauthorized { caller: bob() }));
}

// ===========================================================================
// Module set changes
// ===========================================================================

#[test]
fn replacing_production_keeps_player_state() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    game.level_up(at(alice(), 3_600), Batch::single(0, 2)).unwrap();

    let v2 = Arc::new(ProductionModule::new());
    let selectors = v2.selectors();
    let v2_address = game.proxy_mut().deploy(v2);
    game.proxy_mut()
        .cut(at(owner(), 3_700), vec![ModuleCut::replace(v2_address, selectors)], None)
        .unwrap();
    assert_eq!(game.proxy().module_of(LEVEL_UP.selector()), Some(v2_address));

    let record = view(&mut game, alice(), 3_700).record;
    assert_eq!(record.polygon_levels, vec![3]);
    assert_eq!(record.lines, 7_194);

    game.level_up(at(alice(), 3_700), Batch::single(0, 1)).unwrap();
    assert_eq!(view(&mut game, alice(), 3_700).record.polygon_levels, vec![4]);
}

#[test]
fn removed_operations_become_unknown() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    let selectors = AugmentationModule::new().selectors();
    game.proxy_mut()
        .cut(at(owner(), 1), vec![ModuleCut::remove(selectors)], None)
        .unwrap();

    let result = game.buy_upgrades(at(alice(), 10), Batch::single(0, 1));
    assert_eq!(result, Err(CallError::UnknownOperation(BUY_UPGRADES.selector())));
    assert_eq!(game.proxy().module_addresses().len(), 4);
    assert!(game.proxy().storage().routing().check_consistency().is_ok());
    assert!(game.get_player(at(alice(), 10), alice()).unwrap().is_some());
}

#[test]
fn non_owner_cannot_cut() {
    let mut game = game();
    let selector = Selector([1, 2, 3, 4]);
    let production = game.proxy().module_of(LEVEL_UP.selector()).unwrap();
    let result = game
        .proxy_mut()
        .cut(at(alice(), 1), vec![ModuleCut::add(production, vec![selector])], None);
    assert_eq!(result, Err(CallError::NotAuthorized { caller: alice() }));
    assert_eq!(result.unwrap_err().category(), ErrorCategory::Authorization);
}

#[test]
fn transferred_ownership_moves_cut_rights() {
    let mut game = game();
    game.transfer_ownership(at(owner(), 1), alice()).unwrap();
    assert_eq!(game.owner(at(bob(), 1)).unwrap(), alice());

    let remove = vec![ModuleCut::remove(AugmentationModule::new().selectors())];
    assert!(matches!(
        game.proxy_mut().cut(at(owner(), 2), remove.clone(), None),
        Err(CallError::NotAuthorized { .. })
    ));
    game.proxy_mut().cut(at(alice(), 2), remove, None).unwrap();
}

#[test]
fn snapshot_restores_players() {
    let mut game = game();
    game.start(at(alice(), 0)).unwrap();
    game.level_up(at(alice(), 3_600), Batch::single(0, 2)).unwrap();
    let snapshot = game.proxy().snapshot().unwrap();

    game.level_up(at(alice(), 3_600), Batch::single(0, 1)).unwrap();
    game.proxy_mut().restore(&snapshot).unwrap();
    assert_eq!(view(&mut game, alice(), 3_600).record.polygon_levels, vec![3]);
}
