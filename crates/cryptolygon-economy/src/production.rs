//! Production engine: starting a run and leveling polygons.
//!
//! A player may only level tier `k` once tier `k − 1` is owned, judged
//! against the levels held before the call. Leveling tier `t` from `L` by
//! `n` costs `base_cost(t) × 2^L × (2^n − 1)`; a batch's costs are summed
//! and checked against the freshly accrued balance once.

use crate::accrual;
use crate::batch::{self, Batch, Delta};
use crate::config::{GameConfig, load_config};
use crate::events::{self, GameEvent};
use crate::math::geometric_cost;
use crate::player::{PlayerRecord, find_player, load_player, store_player};
use cryptolygon_core::abi::{Operation, Router};
use cryptolygon_core::error::{CallError, CallResult};
use cryptolygon_core::id::{Address, Selector};
use cryptolygon_core::module::{CallContext, Module};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const START: Operation = Operation::new("production.start()");
pub const LEVEL_UP: Operation = Operation::new("production.level_up(u32[],u32[])");
pub const LEVEL_UP_COST: Operation =
    Operation::new("production.level_up_cost(address,u32[],u32[])");
pub const PRODUCTION_RATE: Operation = Operation::new("production.production_rate(address)");

/// A cost preview for `player` buying `batch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostQuery {
    pub player: Address,
    pub batch: Batch,
}

/// Validate a level-up batch against pre-call levels and price it.
pub fn plan_level_up(
    record: &PlayerRecord,
    config: &GameConfig,
    batch: &Batch,
) -> CallResult<(Vec<Delta>, u128)> {
    let deltas = batch::validate(batch, config.polygon_tier_count())?;
    let unlockable = record.next_unlockable_tier();
    if let Some(skip) = deltas.iter().find(|d| d.id > unlockable) {
        return Err(CallError::PolygonLevelUpNotAllowed {
            tier: skip.id,
            required: skip.id - 1,
        });
    }
    let cost = deltas.iter().fold(0u128, |total, d| {
        let tier = &config.polygons[d.id as usize];
        total.saturating_add(geometric_cost(
            tier.base_cost,
            record.polygon_level(d.id),
            d.amount,
        ))
    });
    Ok((deltas, cost))
}

#[derive(Debug)]
pub struct ProductionModule {
    router: Router<Self>,
}

impl Default for ProductionModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductionModule {
    pub fn new() -> Self {
        Self {
            router: Router::new()
                .route(START, Self::start)
                .route(LEVEL_UP, Self::level_up)
                .route(LEVEL_UP_COST, Self::level_up_cost)
                .route(PRODUCTION_RATE, Self::production_rate),
        }
    }

    fn start(&self, ctx: &mut CallContext<'_>, _: ()) -> CallResult<()> {
        load_config(ctx.storage)?;
        let player = ctx.caller();
        if find_player(ctx.storage, player)?.is_some() {
            return Err(CallError::AlreadyStarted(player));
        }
        store_player(ctx.storage, player, &PlayerRecord::new(ctx.now()))?;
        debug!(%player, timestamp = ctx.now(), "player started");
        events::emit(ctx, &GameEvent::Started { player })
    }

    fn level_up(&self, ctx: &mut CallContext<'_>, batch: Batch) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let player = ctx.caller();
        let mut record = load_player(ctx.storage, player)?;
        accrual::accrue(&mut record, &config, ctx.now());

        let (deltas, cost) = plan_level_up(&record, &config, &batch)?;
        if cost == u128::MAX || cost > record.lines {
            return Err(CallError::NotEnoughLinesToLevelUp {
                required: cost,
                available: record.lines,
            });
        }

        record.lines -= cost;
        for delta in &deltas {
            record.add_polygon_levels(delta.id, delta.amount);
        }
        record.recount_polygon_levels();
        store_player(ctx.storage, player, &record)?;

        debug!(%player, cost, total_levels = record.total_polygon_levels, "polygons leveled");
        events::emit(
            ctx,
            &GameEvent::PolygonsLeveled {
                player,
                ids: batch.ids,
                amounts: batch.amounts,
                cost,
            },
        )?;
        Ok(cost)
    }

    fn level_up_cost(&self, ctx: &mut CallContext<'_>, query: CostQuery) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let record = load_player(ctx.storage, query.player)?;
        plan_level_up(&record, &config, &query.batch).map(|(_, cost)| cost)
    }

    fn production_rate(&self, ctx: &mut CallContext<'_>, player: Address) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let record = load_player(ctx.storage, player)?;
        Ok(accrual::production_rate(&record, &config))
    }
}

impl Module for ProductionModule {
    fn name(&self) -> &str {
        "production"
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
