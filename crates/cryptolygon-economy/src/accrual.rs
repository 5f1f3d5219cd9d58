//! The shared rate contract and lazy accrual.
//!
//! Production is never ticked. Every touch of a player folds the time since
//! `last_accrual` into the balance at the current rate:
//!
//! ```text
//! rate = Σ base_rate(t) × level(t)
//!      × (1 + Σ upgrade_effect(u) × upgrade_level(u))
//!      × (1 + Σ perk_effect(p) × perk_level(p))
//! ```
//!
//! Sums and products saturate.

use crate::config::GameConfig;
use crate::player::PlayerRecord;
use cryptolygon_core::id::Timestamp;

pub fn base_rate(record: &PlayerRecord, config: &GameConfig) -> u128 {
    record
        .polygon_levels
        .iter()
        .zip(&config.polygons)
        .fold(0u128, |acc, (&level, tier)| {
            acc.saturating_add(tier.base_rate.saturating_mul(u128::from(level)))
        })
}

pub fn upgrade_multiplier(record: &PlayerRecord, config: &GameConfig) -> u128 {
    record
        .upgrade_levels
        .iter()
        .filter_map(|(&id, &level)| {
            let tier = config.upgrades.get(id as usize)?;
            Some(tier.effect.saturating_mul(u128::from(level)))
        })
        .fold(1u128, u128::saturating_add)
}

pub fn perk_multiplier(record: &PlayerRecord, config: &GameConfig) -> u128 {
    record
        .perk_levels
        .iter()
        .filter_map(|(&id, &level)| {
            let tier = config.perks.get(id as usize)?;
            Some(tier.effect.saturating_mul(u128::from(level)))
        })
        .fold(1u128, u128::saturating_add)
}

/// Lines per second.
pub fn production_rate(record: &PlayerRecord, config: &GameConfig) -> u128 {
    base_rate(record, config)
        .saturating_mul(upgrade_multiplier(record, config))
        .saturating_mul(perk_multiplier(record, config))
}

/// Lines `record` would gain by accruing at `now`. Time never runs
/// backwards: a `now` before `last_accrual` gains nothing.
pub fn pending_lines(record: &PlayerRecord, config: &GameConfig, now: Timestamp) -> u128 {
    let elapsed = now.saturating_sub(record.last_accrual);
    production_rate(record, config).saturating_mul(u128::from(elapsed))
}

/// Bring `record` up to `now`. Returns the lines gained.
///
/// Gains land in the spendable balance and in the current run's total.
/// Earlier runs' total only changes at ascension.
pub fn accrue(record: &mut PlayerRecord, config: &GameConfig, now: Timestamp) -> u128 {
    let gained = pending_lines(record, config, now);
    record.lines = record.lines.saturating_add(gained);
    record.run_lines = record.run_lines.saturating_add(gained);
    record.last_accrual = record.last_accrual.max(now);
    gained
}
