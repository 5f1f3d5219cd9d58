//! Augmentation engine: upgrades bought with lines.
//!
//! Same cost curve and batch discipline as polygon level-ups, without the
//! unlock ordering. Upgrade levels feed the rate through
//! [`accrual::upgrade_multiplier`].

use crate::accrual;
use crate::batch::{self, Batch, Delta};
use crate::config::{GameConfig, load_config};
use crate::events::{self, GameEvent};
use crate::math::geometric_cost;
use crate::player::{PlayerRecord, load_player, store_player};
use crate::production::CostQuery;
use cryptolygon_core::abi::{Operation, Router};
use cryptolygon_core::error::{CallError, CallResult};
use cryptolygon_core::id::Selector;
use cryptolygon_core::module::{CallContext, Module};
use tracing::debug;

pub const BUY_UPGRADES: Operation = Operation::new("augmentation.buy_upgrades(u32[],u32[])");
pub const UPGRADE_COST: Operation =
    Operation::new("augmentation.upgrade_cost(address,u32[],u32[])");

pub fn plan_upgrades(
    record: &PlayerRecord,
    config: &GameConfig,
    batch: &Batch,
) -> CallResult<(Vec<Delta>, u128)> {
    let deltas = batch::validate(batch, config.upgrade_tier_count())?;
    let cost = deltas.iter().fold(0u128, |total, d| {
        let tier = &config.upgrades[d.id as usize];
        total.saturating_add(geometric_cost(
            tier.base_cost,
            record.upgrade_level(d.id),
            d.amount,
        ))
    });
    Ok((deltas, cost))
}

#[derive(Debug)]
pub struct AugmentationModule {
    router: Router<Self>,
}

impl Default for AugmentationModule {
    fn default() -> Self {
        Self::new()
    }
}

impl AugmentationModule {
    pub fn new() -> Self {
        Self {
            router: Router::new()
                .route(BUY_UPGRADES, Self::buy_upgrades)
                .route(UPGRADE_COST, Self::upgrade_cost),
        }
    }

    fn buy_upgrades(&self, ctx: &mut CallContext<'_>, batch: Batch) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let player = ctx.caller();
        let mut record = load_player(ctx.storage, player)?;
        accrual::accrue(&mut record, &config, ctx.now());

        let (deltas, cost) = plan_upgrades(&record, &config, &batch)?;
        if cost == u128::MAX || cost > record.lines {
            return Err(CallError::NotEnoughLinesToBuyUpgrade {
                required: cost,
                available: record.lines,
            });
        }

        record.lines -= cost;
        for delta in &deltas {
            let level = record.upgrade_levels.entry(delta.id).or_insert(0);
            *level = level.saturating_add(delta.amount);
        }
        store_player(ctx.storage, player, &record)?;

        debug!(%player, cost, "upgrades bought");
        events::emit(
            ctx,
            &GameEvent::UpgradesBought {
                player,
                ids: batch.ids,
                amounts: batch.amounts,
                cost,
            },
        )?;
        Ok(cost)
    }

    fn upgrade_cost(&self, ctx: &mut CallContext<'_>, query: CostQuery) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let record = load_player(ctx.storage, query.player)?;
        plan_upgrades(&record, &config, &query.batch).map(|(_, cost)| cost)
    }
}

impl Module for AugmentationModule {
    fn name(&self) -> &str {
        "augmentation"
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
