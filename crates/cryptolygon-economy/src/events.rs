//! Game events.
//!
//! Gameplay modules log through the proxy's generic `Custom` event with the
//! `game` topic and a bitcode payload, so the core event type stays free of
//! game vocabulary.

use cryptolygon_core::abi;
use cryptolygon_core::error::CallResult;
use cryptolygon_core::event::{Event, EventLog};
use cryptolygon_core::id::Address;
use cryptolygon_core::module::CallContext;
use serde::{Deserialize, Serialize};

pub const GAME_TOPIC: &str = "game";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Initialized {
        token: Address,
        polygon_tiers: u32,
    },
    Started {
        player: Address,
    },
    PolygonsLeveled {
        player: Address,
        ids: Vec<u32>,
        amounts: Vec<u32>,
        cost: u128,
    },
    UpgradesBought {
        player: Address,
        ids: Vec<u32>,
        amounts: Vec<u32>,
        cost: u128,
    },
    PerksBought {
        player: Address,
        ids: Vec<u32>,
        amounts: Vec<u32>,
        cost: u128,
    },
    Ascended {
        player: Address,
        run_lines: u128,
        award: u128,
        ascension_count: u32,
    },
}

pub(crate) fn emit(ctx: &mut CallContext<'_>, event: &GameEvent) -> CallResult<()> {
    let payload = abi::encode(event)?;
    ctx.emit(Event::Custom {
        topic: GAME_TOPIC.to_string(),
        payload,
    });
    Ok(())
}

/// Decode every game event in `log`, skipping payloads that do not decode.
pub fn game_events(log: &EventLog) -> Vec<GameEvent> {
    log.iter_custom(GAME_TOPIC)
        .filter_map(|payload| abi::decode(payload).ok())
        .collect()
}
