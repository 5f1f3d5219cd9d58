//! Typed access to a deployed game.
//!
//! [`GameClient`] owns the proxy and encodes every request and decodes
//! every response, so callers never touch raw call data. Every call takes
//! the [`Env`] it runs under: the caller and the host timestamp.

use crate::augmentation::{BUY_UPGRADES, UPGRADE_COST};
use crate::batch::Batch;
use crate::catalog::{GET_PLAYER, PERK_TIERS, POLYGON_TIERS, TOKEN, UPGRADE_TIERS};
use crate::config::{PerkTier, PolygonTier, UpgradeTier};
use crate::events::{GameEvent, game_events};
use crate::player::PlayerView;
use crate::prestige::{ASCEND, ASCENSION_AWARD, BUY_PERKS, PERK_COST, PerkCostQuery};
use crate::production::{CostQuery, LEVEL_UP, LEVEL_UP_COST, PRODUCTION_RATE, START};
use cryptolygon_core::abi::{self, Operation};
use cryptolygon_core::admin::{OWNER, TRANSFER_OWNERSHIP};
use cryptolygon_core::error::CallResult;
use cryptolygon_core::id::{Address, Env};
use cryptolygon_core::proxy::Proxy;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug)]
pub struct GameClient {
    proxy: Proxy,
}

impl GameClient {
    pub fn new(proxy: Proxy) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }

    pub fn proxy_mut(&mut self) -> &mut Proxy {
        &mut self.proxy
    }

    pub fn into_proxy(self) -> Proxy {
        self.proxy
    }

    fn call<Req, Resp>(&mut self, env: Env, operation: Operation, request: &Req) -> CallResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let data = abi::encode(request)?;
        let raw = self.proxy.call(env, operation.selector(), &data)?;
        abi::decode(&raw)
    }

    // -----------------------------------------------------------------------
    // Production
    // -----------------------------------------------------------------------

    pub fn start(&mut self, env: Env) -> CallResult<()> {
        self.call(env, START, &())
    }

    /// Returns the lines spent.
    pub fn level_up(&mut self, env: Env, batch: Batch) -> CallResult<u128> {
        self.call(env, LEVEL_UP, &batch)
    }

    pub fn level_up_cost(&mut self, env: Env, player: Address, batch: Batch) -> CallResult<u128> {
        self.call(env, LEVEL_UP_COST, &CostQuery { player, batch })
    }

    pub fn production_rate(&mut self, env: Env, player: Address) -> CallResult<u128> {
        self.call(env, PRODUCTION_RATE, &player)
    }

    // -----------------------------------------------------------------------
    // Augmentation
    // -----------------------------------------------------------------------

    pub fn buy_upgrades(&mut self, env: Env, batch: Batch) -> CallResult<u128> {
        self.call(env, BUY_UPGRADES, &batch)
    }

    pub fn upgrade_cost(&mut self, env: Env, player: Address, batch: Batch) -> CallResult<u128> {
        self.call(env, UPGRADE_COST, &CostQuery { player, batch })
    }

    // -----------------------------------------------------------------------
    // Prestige
    // -----------------------------------------------------------------------

    pub fn perk_cost(&mut self, env: Env, id: u32, level: u32, amount: u32) -> CallResult<u128> {
        self.call(env, PERK_COST, &PerkCostQuery { id, level, amount })
    }

    /// Returns the circles burned.
    pub fn buy_perks(&mut self, env: Env, batch: Batch) -> CallResult<u128> {
        self.call(env, BUY_PERKS, &batch)
    }

    /// Returns the circles minted.
    pub fn ascend(&mut self, env: Env) -> CallResult<u128> {
        self.call(env, ASCEND, &())
    }

    pub fn ascension_award(&mut self, env: Env, player: Address) -> CallResult<u128> {
        self.call(env, ASCENSION_AWARD, &player)
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub fn polygon_tiers(&mut self, env: Env) -> CallResult<Vec<PolygonTier>> {
        self.call(env, POLYGON_TIERS, &())
    }

    pub fn upgrade_tiers(&mut self, env: Env) -> CallResult<Vec<UpgradeTier>> {
        self.call(env, UPGRADE_TIERS, &())
    }

    pub fn perk_tiers(&mut self, env: Env) -> CallResult<Vec<PerkTier>> {
        self.call(env, PERK_TIERS, &())
    }

    pub fn token(&mut self, env: Env) -> CallResult<Address> {
        self.call(env, TOKEN, &())
    }

    pub fn get_player(&mut self, env: Env, player: Address) -> CallResult<Option<PlayerView>> {
        self.call(env, GET_PLAYER, &player)
    }

    // -----------------------------------------------------------------------
    // Ownership and balances
    // -----------------------------------------------------------------------

    pub fn owner(&mut self, env: Env) -> CallResult<Address> {
        self.call(env, OWNER, &())
    }

    pub fn transfer_ownership(&mut self, env: Env, new_owner: Address) -> CallResult<()> {
        self.call(env, TRANSFER_OWNERSHIP, &new_owner)
    }

    pub fn circles(&self, player: Address) -> u128 {
        self.proxy.token().balance_of(player)
    }

    pub fn events(&self) -> Vec<GameEvent> {
        game_events(self.proxy.events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::deploy::deploy_game;
    use cryptolygon_core::error::CallError;
    use cryptolygon_core::test_utils::{addr, owner};

    fn client() -> GameClient {
        deploy_game(owner(), GameConfig::default(), 0)
            .unwrap()
            .into_client()
    }

    #[test]
    fn catalog_reports_genesis_tiers() {
        let mut game = client();
        let env = Env::new(addr(5), 0);
        let polygons = game.polygon_tiers(env).unwrap();
        assert_eq!(polygons.len(), 7);
        assert_eq!(polygons[1].base_cost, 20);
        assert_eq!(game.upgrade_tiers(env).unwrap().len(), 4);
        assert_eq!(game.perk_tiers(env).unwrap()[2].weight, 10);
        assert_eq!(game.token(env).unwrap(), game.proxy().token().address());
        assert_eq!(game.owner(env).unwrap(), owner());
    }

    #[test]
    fn start_twice_is_already_started() {
        let mut game = client();
        let alice = addr(10);
        game.start(Env::new(alice, 5)).unwrap();
        assert_eq!(
            game.start(Env::new(alice, 6)),
            Err(CallError::AlreadyStarted(alice))
        );
        assert_eq!(
            game.events().last(),
            Some(&GameEvent::Started { player: alice })
        );
    }

    #[test]
    fn get_player_projects_pending_lines() {
        let mut game = client();
        let alice = addr(10);
        assert_eq!(game.get_player(Env::new(alice, 0), alice).unwrap(), None);

        game.start(Env::new(alice, 100)).unwrap();
        let view = game.get_player(Env::new(addr(3), 110), alice).unwrap().unwrap();
        assert_eq!(view.rate, 2);
        assert_eq!(view.pending_lines, 20);
        assert_eq!(view.record.lines, 0);
        assert_eq!(view.record.polygon_levels, vec![1]);
    }

    #[test]
    fn gameplay_before_start_is_not_started() {
        let mut game = client();
        let bob = addr(11);
        assert_eq!(
            game.level_up(Env::new(bob, 1), Batch::single(0, 1)),
            Err(CallError::NotStarted(bob))
        );
        assert_eq!(game.ascend(Env::new(bob, 1)), Err(CallError::NotStarted(bob)));
        assert_eq!(
            game.production_rate(Env::new(bob, 1), bob),
            Err(CallError::NotStarted(bob))
        );
    }

    #[test]
    fn cost_previews_do_not_spend() {
        let mut game = client();
        let alice = addr(10);
        game.start(Env::new(alice, 0)).unwrap();
        let env = Env::new(alice, 10);
        assert_eq!(game.level_up_cost(env, alice, Batch::single(0, 2)).unwrap(), 6);
        assert_eq!(game.upgrade_cost(env, alice, Batch::single(2, 1)).unwrap(), 1_000);
        assert_eq!(
            game.perk_cost(env, 2, 0, 1).unwrap(),
            10_000_000_000 * crate::config::DEFAULT_SCALE_FACTOR
        );
        assert!(matches!(
            game.perk_cost(env, 3, 0, 1),
            Err(CallError::InvalidArguments(_))
        ));
        let view = game.get_player(env, alice).unwrap().unwrap();
        assert_eq!(view.record.lines, 0);
    }
}
