//! Prestige engine: ascension perks and the ascension reset.
//!
//! Ascending converts a run's production into circles on a logarithmic
//! curve (see [`math::ascension_points`]) and restarts the run. Perks are
//! bought with circles and survive ascension.

use crate::accrual;
use crate::batch::{self, Batch, Delta};
use crate::config::{GameConfig, load_config};
use crate::events::{self, GameEvent};
use crate::math;
use crate::player::{PlayerRecord, load_player, store_player};
use cryptolygon_core::abi::{Operation, Router};
use cryptolygon_core::error::{CallError, CallResult};
use cryptolygon_core::id::{Address, Selector};
use cryptolygon_core::module::{CallContext, Module};
use cryptolygon_core::token::TokenError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const PERK_COST: Operation = Operation::new("prestige.perk_cost(u32,u32,u32)");
pub const BUY_PERKS: Operation = Operation::new("prestige.buy_perks(u32[],u32[])");
pub const ASCEND: Operation = Operation::new("prestige.ascend()");
pub const ASCENSION_AWARD: Operation = Operation::new("prestige.ascension_award(address)");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerkCostQuery {
    pub id: u32,
    pub level: u32,
    pub amount: u32,
}

pub fn plan_perks(
    record: &PlayerRecord,
    config: &GameConfig,
    batch: &Batch,
) -> CallResult<(Vec<Delta>, u128)> {
    let deltas = batch::validate(batch, config.perk_tier_count())?;
    let cost = deltas.iter().fold(0u128, |total, d| {
        let tier = &config.perks[d.id as usize];
        total.saturating_add(math::perk_cost(
            tier.weight,
            record.perk_level(d.id),
            d.amount,
            config.scale_factor,
        ))
    });
    Ok((deltas, cost))
}

/// Circles `record` would receive for ascending now.
pub fn award_for(record: &PlayerRecord, config: &GameConfig) -> u128 {
    math::ascension_award(
        record.run_lines,
        record.lifetime_lines,
        config.ascension_threshold_log2,
        config.scale_factor,
    )
}

/// Close the current run: fold it into the lifetime total and reset every
/// per-run counter. Perk levels are kept.
pub fn reset_run(record: &mut PlayerRecord, now: u64) {
    record.lifetime_lines = record.lifetime_lines.saturating_add(record.run_lines);
    record.polygon_levels = vec![1];
    record.total_polygon_levels = 1;
    record.upgrade_levels.clear();
    record.lines = 0;
    record.run_lines = 0;
    record.ascension_count = record.ascension_count.saturating_add(1);
    record.last_accrual = now;
}

#[derive(Debug)]
pub struct PrestigeModule {
    router: Router<Self>,
}

impl Default for PrestigeModule {
    fn default() -> Self {
        Self::new()
    }
}

impl PrestigeModule {
    pub fn new() -> Self {
        Self {
            router: Router::new()
                .route(PERK_COST, Self::perk_cost)
                .route(BUY_PERKS, Self::buy_perks)
                .route(ASCEND, Self::ascend)
                .route(ASCENSION_AWARD, Self::ascension_award),
        }
    }

    fn perk_cost(&self, ctx: &mut CallContext<'_>, query: PerkCostQuery) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let tier = config.perks.get(query.id as usize).ok_or_else(|| {
            CallError::invalid(format!(
                "perk {} out of range ({} perks)",
                query.id,
                config.perks.len()
            ))
        })?;
        Ok(math::perk_cost(
            tier.weight,
            query.level,
            query.amount,
            config.scale_factor,
        ))
    }

    fn buy_perks(&self, ctx: &mut CallContext<'_>, batch: Batch) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let player = ctx.caller();
        let mut record = load_player(ctx.storage, player)?;
        // Bank production at the old rate before perks change it.
        accrual::accrue(&mut record, &config, ctx.now());

        let (deltas, cost) = plan_perks(&record, &config, &batch)?;
        if cost == u128::MAX {
            return Err(TokenError::InsufficientBalance {
                required: cost,
                available: ctx.token.balance_of(player),
            }
            .into());
        }
        ctx.burn(player, cost)?;

        for delta in &deltas {
            let level = record.perk_levels.entry(delta.id).or_insert(0);
            *level = level.saturating_add(delta.amount);
        }
        store_player(ctx.storage, player, &record)?;

        debug!(%player, cost, "perks bought");
        events::emit(
            ctx,
            &GameEvent::PerksBought {
                player,
                ids: batch.ids,
                amounts: batch.amounts,
                cost,
            },
        )?;
        Ok(cost)
    }

    fn ascend(&self, ctx: &mut CallContext<'_>, _: ()) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let player = ctx.caller();
        let mut record = load_player(ctx.storage, player)?;
        accrual::accrue(&mut record, &config, ctx.now());

        let run_lines = record.run_lines;
        let award = award_for(&record, &config);
        if award > 0 {
            ctx.mint(player, award)?;
        }
        reset_run(&mut record, ctx.now());
        store_player(ctx.storage, player, &record)?;

        info!(
            %player,
            run_lines,
            award,
            ascension_count = record.ascension_count,
            "player ascended"
        );
        events::emit(
            ctx,
            &GameEvent::Ascended {
                player,
                run_lines,
                award,
                ascension_count: record.ascension_count,
            },
        )?;
        Ok(award)
    }

    fn ascension_award(&self, ctx: &mut CallContext<'_>, player: Address) -> CallResult<u128> {
        let config = load_config(ctx.storage)?;
        let mut record = load_player(ctx.storage, player)?;
        accrual::accrue(&mut record, &config, ctx.now());
        Ok(award_for(&record, &config))
    }
}

impl Module for PrestigeModule {
    fn name(&self) -> &str {
        "prestige"
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
