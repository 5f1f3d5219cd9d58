//! Per-player records in the `players` namespace.

use cryptolygon_core::error::{CallError, CallResult};
use cryptolygon_core::id::{Address, Timestamp};
use cryptolygon_core::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PLAYERS_NAMESPACE: &str = "players";

/// Everything the game knows about one player. Created by `start`, never
/// deleted.
///
/// `polygon_levels` is a prefix of owned tiers: its length is the highest
/// unlocked tier plus one and every entry is at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub polygon_levels: Vec<u32>,
    pub upgrade_levels: BTreeMap<u32, u32>,
    pub perk_levels: BTreeMap<u32, u32>,
    pub total_polygon_levels: u64,
    pub last_accrual: Timestamp,
    /// Spendable now.
    pub lines: u128,
    /// Produced during the current run.
    pub run_lines: u128,
    /// Produced during all completed runs.
    pub lifetime_lines: u128,
    pub ascension_count: u32,
}

impl PlayerRecord {
    /// A fresh run owning polygon tier 0 at level 1.
    pub fn new(now: Timestamp) -> Self {
        Self {
            polygon_levels: vec![1],
            upgrade_levels: BTreeMap::new(),
            perk_levels: BTreeMap::new(),
            total_polygon_levels: 1,
            last_accrual: now,
            lines: 0,
            run_lines: 0,
            lifetime_lines: 0,
            ascension_count: 0,
        }
    }

    pub fn polygon_level(&self, tier: u32) -> u32 {
        self.polygon_levels.get(tier as usize).copied().unwrap_or(0)
    }

    pub fn upgrade_level(&self, tier: u32) -> u32 {
        self.upgrade_levels.get(&tier).copied().unwrap_or(0)
    }

    pub fn perk_level(&self, tier: u32) -> u32 {
        self.perk_levels.get(&tier).copied().unwrap_or(0)
    }

    /// The highest tier the player may level right now.
    pub fn next_unlockable_tier(&self) -> u32 {
        self.polygon_levels.len() as u32
    }

    pub(crate) fn recount_polygon_levels(&mut self) {
        self.total_polygon_levels = self.polygon_levels.iter().map(|&l| u64::from(l)).sum();
    }

    /// Add `amount` levels to `tier`. A tier one past the owned prefix
    /// extends it.
    pub(crate) fn add_polygon_levels(&mut self, tier: u32, amount: u32) {
        let index = tier as usize;
        if index == self.polygon_levels.len() {
            self.polygon_levels.push(amount);
        } else if let Some(level) = self.polygon_levels.get_mut(index) {
            *level = level.saturating_add(amount);
        }
    }

    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if self.lines > self.run_lines {
            return Err(format!(
                "spendable lines {} exceed run lines {}",
                self.lines, self.run_lines
            ));
        }
        if self.polygon_levels.first().copied().unwrap_or(0) == 0 {
            return Err("tier 0 must be owned".to_string());
        }
        if let Some(tier) = self.polygon_levels.iter().position(|&l| l == 0) {
            return Err(format!("tier {tier} is inside the owned prefix at level 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Read-only view of a player, with production brought up to the query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub address: Address,
    pub record: PlayerRecord,
    /// Lines per second at the current levels.
    pub rate: u128,
    /// Lines that will be credited on the next touch.
    pub pending_lines: u128,
}

// ---------------------------------------------------------------------------
// Registry access
// ---------------------------------------------------------------------------

pub fn find_player(storage: &Storage, player: Address) -> CallResult<Option<PlayerRecord>> {
    storage.get(PLAYERS_NAMESPACE, &player.0)
}

pub fn load_player(storage: &Storage, player: Address) -> CallResult<PlayerRecord> {
    find_player(storage, player)?.ok_or(CallError::NotStarted(player))
}

pub(crate) fn store_player(
    storage: &mut Storage,
    player: Address,
    record: &PlayerRecord,
) -> CallResult<()> {
    debug_assert!(record.check_invariants().is_ok(), "{:?}", record.check_invariants());
    storage.put(PLAYERS_NAMESPACE, &player.0, record)
}

pub fn player_count(storage: &Storage) -> usize {
    storage
        .namespace(PLAYERS_NAMESPACE)
        .map(|ns| ns.len())
        .unwrap_or(0)
}
