//! Genesis initializer, run once in the proxy's context by the first cut.

use crate::config::{GameConfig, is_initialized, store_config};
use crate::events::{self, GameEvent};
use cryptolygon_core::abi::{Operation, Router};
use cryptolygon_core::error::{CallError, CallResult};
use cryptolygon_core::id::Selector;
use cryptolygon_core::module::{CallContext, Module};
use tracing::info;

pub const INIT: Operation = Operation::new("genesis.init(config)");

#[derive(Debug)]
pub struct GenesisModule {
    router: Router<Self>,
}

impl Default for GenesisModule {
    fn default() -> Self {
        Self::new()
    }
}

impl GenesisModule {
    pub fn new() -> Self {
        Self {
            router: Router::new().route(INIT, Self::init),
        }
    }

    /// Store the configuration. Owner only, and only once.
    fn init(&self, ctx: &mut CallContext<'_>, config: GameConfig) -> CallResult<()> {
        ctx.require_owner()?;
        if is_initialized(ctx.storage) {
            return Err(CallError::AlreadyInitialized);
        }
        config.validate().map_err(CallError::InvalidArguments)?;
        let token = ctx.token.address();
        if config.token != token {
            return Err(CallError::invalid(format!(
                "config names token {} but the proxy uses {}",
                config.token, token
            )));
        }

        store_config(ctx.storage, &config)?;
        info!(
            %token,
            polygon_tiers = config.polygons.len(),
            upgrade_tiers = config.upgrades.len(),
            perk_tiers = config.perks.len(),
            "game initialized"
        );
        events::emit(
            ctx,
            &GameEvent::Initialized {
                token,
                polygon_tiers: config.polygon_tier_count(),
            },
        )
    }
}

impl Module for GenesisModule {
    fn name(&self) -> &str {
        "genesis"
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
