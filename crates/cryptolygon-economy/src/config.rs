//! Write-once game configuration.
//!
//! The configuration is stored at genesis under the `config` namespace and
//! never changes afterwards. Every gameplay module re-reads it per call.

use cryptolygon_core::error::{CallError, CallResult};
use cryptolygon_core::id::Address;
use cryptolygon_core::storage::Storage;
use serde::{Deserialize, Serialize};

pub const CONFIG_NAMESPACE: &str = "config";
const CONFIG_KEY: &[u8] = b"game";

/// Circle base units per award point.
pub const DEFAULT_SCALE_FACTOR: u128 = 1_000_000_000_000_000_000;

/// Runs producing fewer than `2^35` lines earn nothing on ascension.
pub const DEFAULT_ASCENSION_THRESHOLD_LOG2: u32 = 35;

// ---------------------------------------------------------------------------
// Tier types
// ---------------------------------------------------------------------------

/// A polygon tier: lines produced per level per second, and the cost of the
/// first level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonTier {
    pub base_cost: u128,
    pub base_rate: u128,
}

/// An upgrade tier. Each level adds `effect` to the upgrade multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTier {
    pub base_cost: u128,
    pub effect: u128,
}

/// An ascension perk. `weight` drives the circle cost, each level adds
/// `effect` to the perk multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerkTier {
    pub weight: u32,
    pub effect: u128,
}

const fn polygon(base_cost: u128, base_rate: u128) -> PolygonTier {
    PolygonTier {
        base_cost,
        base_rate,
    }
}

const fn upgrade(base_cost: u128, effect: u128) -> UpgradeTier {
    UpgradeTier { base_cost, effect }
}

const fn perk(weight: u32, effect: u128) -> PerkTier {
    PerkTier { weight, effect }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub polygons: Vec<PolygonTier>,
    pub upgrades: Vec<UpgradeTier>,
    pub perks: Vec<PerkTier>,
    /// Address of the circle token. Filled in by deployment when absent.
    #[serde(default)]
    pub token: Address,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: u128,
    #[serde(default = "default_threshold")]
    pub ascension_threshold_log2: u32,
}

fn default_scale_factor() -> u128 {
    DEFAULT_SCALE_FACTOR
}

fn default_threshold() -> u32 {
    DEFAULT_ASCENSION_THRESHOLD_LOG2
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            polygons: vec![
                polygon(1, 2),
                polygon(20, 5),
                polygon(400, 20),
                polygon(8_000, 50),
                polygon(160_000, 200),
                polygon(3_200_000, 1_000),
                polygon(64_000_000, 5_000),
            ],
            upgrades: vec![
                upgrade(1, 1),
                upgrade(1, 1),
                upgrade(1_000, 1),
                upgrade(1_000, 1),
            ],
            perks: vec![perk(1, 1), perk(1, 1), perk(10, 1)],
            token: Address::ZERO,
            scale_factor: DEFAULT_SCALE_FACTOR,
            ascension_threshold_log2: DEFAULT_ASCENSION_THRESHOLD_LOG2,
        }
    }
}

impl GameConfig {
    pub fn with_token(mut self, token: Address) -> Self {
        self.token = token;
        self
    }

    /// Check the structural rules every stored configuration satisfies.
    /// The token address is checked separately at genesis.
    pub fn validate(&self) -> Result<(), String> {
        if self.polygons.is_empty() {
            return Err("at least one polygon tier is required".to_string());
        }
        if let Some(index) = self.polygons.iter().position(|t| t.base_rate == 0) {
            return Err(format!("polygon tier {index} has a zero base rate"));
        }
        if self.ascension_threshold_log2 >= 128 {
            return Err(format!(
                "ascension threshold 2^{} does not fit in 128 bits",
                self.ascension_threshold_log2
            ));
        }
        if self.scale_factor == 0 {
            return Err("scale factor must be nonzero".to_string());
        }
        Ok(())
    }

    pub fn ascension_threshold(&self) -> u128 {
        1u128 << self.ascension_threshold_log2
    }

    pub fn polygon_tier_count(&self) -> u32 {
        self.polygons.len() as u32
    }

    pub fn upgrade_tier_count(&self) -> u32 {
        self.upgrades.len() as u32
    }

    pub fn perk_tier_count(&self) -> u32 {
        self.perks.len() as u32
    }
}

// ---------------------------------------------------------------------------
// Registry access
// ---------------------------------------------------------------------------

pub fn load_config(storage: &Storage) -> CallResult<GameConfig> {
    storage
        .get(CONFIG_NAMESPACE, CONFIG_KEY)?
        .ok_or(CallError::NotInitialized)
}

pub fn is_initialized(storage: &Storage) -> bool {
    storage.contains(CONFIG_NAMESPACE, CONFIG_KEY)
}

pub(crate) fn store_config(storage: &mut Storage, config: &GameConfig) -> CallResult<()> {
    storage.put(CONFIG_NAMESPACE, CONFIG_KEY, config)
}
