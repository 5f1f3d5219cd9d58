//! Read-only catalog queries: tier lists, the token address and player
//! projections.

use crate::accrual;
use crate::config::{PerkTier, PolygonTier, UpgradeTier, load_config};
use crate::player::{PlayerView, find_player};
use cryptolygon_core::abi::{Operation, Router};
use cryptolygon_core::error::CallResult;
use cryptolygon_core::id::{Address, Selector};
use cryptolygon_core::module::{CallContext, Module};

pub const POLYGON_TIERS: Operation = Operation::new("catalog.polygon_tiers()");
pub const UPGRADE_TIERS: Operation = Operation::new("catalog.upgrade_tiers()");
pub const PERK_TIERS: Operation = Operation::new("catalog.perk_tiers()");
pub const TOKEN: Operation = Operation::new("catalog.token()");
pub const GET_PLAYER: Operation = Operation::new("catalog.get_player(address)");

#[derive(Debug)]
pub struct CatalogModule {
    router: Router<Self>,
}

impl Default for CatalogModule {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogModule {
    pub fn new() -> Self {
        Self {
            router: Router::new()
                .route(POLYGON_TIERS, Self::polygon_tiers)
                .route(UPGRADE_TIERS, Self::upgrade_tiers)
                .route(PERK_TIERS, Self::perk_tiers)
                .route(TOKEN, Self::token)
                .route(GET_PLAYER, Self::get_player),
        }
    }

    fn polygon_tiers(&self, ctx: &mut CallContext<'_>, _: ()) -> CallResult<Vec<PolygonTier>> {
        Ok(load_config(ctx.storage)?.polygons)
    }

    fn upgrade_tiers(&self, ctx: &mut CallContext<'_>, _: ()) -> CallResult<Vec<UpgradeTier>> {
        Ok(load_config(ctx.storage)?.upgrades)
    }

    fn perk_tiers(&self, ctx: &mut CallContext<'_>, _: ()) -> CallResult<Vec<PerkTier>> {
        Ok(load_config(ctx.storage)?.perks)
    }

    fn token(&self, ctx: &mut CallContext<'_>, _: ()) -> CallResult<Address> {
        Ok(load_config(ctx.storage)?.token)
    }

    /// `None` for addresses that never started.
    fn get_player(
        &self,
        ctx: &mut CallContext<'_>,
        player: Address,
    ) -> CallResult<Option<PlayerView>> {
        let config = load_config(ctx.storage)?;
        let Some(record) = find_player(ctx.storage, player)? else {
            return Ok(None);
        };
        Ok(Some(PlayerView {
            address: player,
            rate: accrual::production_rate(&record, &config),
            pending_lines: accrual::pending_lines(&record, &config, ctx.now()),
            record,
        }))
    }
}

impl Module for CatalogModule {
    fn name(&self) -> &str {
        "catalog"
    }

    fn selectors(&self) -> Vec<Selector> {
        self.router.selectors()
    }

    fn invoke(
        &self,
        ctx: &mut CallContext<'_>,
        selector: Selector,
        data: &[u8],
    ) -> CallResult<Vec<u8>> {
        self.router.dispatch(self, ctx, selector, data)
    }
}
