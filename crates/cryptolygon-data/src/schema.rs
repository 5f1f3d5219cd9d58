//! Serde data file structs for the game configuration.
//!
//! These define the on-disk format of `config.{ron,toml,json}`. Amounts are
//! `u64` so every format (TOML included) can express them; the loader widens
//! them into the engine's `GameConfig`.

use serde::Deserialize;

/// A polygon tier, either as a `(base_cost, base_rate)` pair or in full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PolygonData {
    Short(u64, u64),
    Full { base_cost: u64, base_rate: u64 },
}

/// An upgrade tier, either as a `(base_cost, effect)` pair or in full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UpgradeData {
    Short(u64, u64),
    Full { base_cost: u64, effect: u64 },
}

/// An ascension perk, either as a `(weight, effect)` pair or in full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PerkData {
    Short(u32, u64),
    Full { weight: u32, effect: u64 },
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfigData {
    pub polygons: Vec<PolygonData>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeData>,
    #[serde(default)]
    pub perks: Vec<PerkData>,
    /// Hex address of an existing circle token, if any.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub scale_factor: Option<u64>,
    #[serde(default)]
    pub ascension_threshold_log2: Option<u32>,
}
