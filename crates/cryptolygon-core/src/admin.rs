//! Single-owner administration module.
//!
//! The owner recorded in the registry's admin namespace is the only caller
//! allowed to cut the module set or run genesis initialization.

use crate::abi::{Operation, Router};
use crate::error::CallResult;
use crate::event::Event;
use crate::id::{Address, Selector};
use crate::module::{CallContext, Module};
use tracing::info;

pub const OWNER: Operation = Operation::new("ownership.owner()");
pub const TRANSFER_OWNERSHIP: Operation = Operation::new("ownership.transfer_ownership(address)");

#[derive(Debug)]
pub struct OwnershipModule {
    router: Router<Self>,
}

impl Default for OwnershipModule {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnershipModule {
    pub fn new() -> Self {
        Self {
            router: Router::new()
                .route(OWNER, Self::owner)
                .route(TRANSFER_OWNERSHIP, Self::transfer_ownership),
        }
    }

    fn owner(&self, ctx: &mut CallContext<'_>, _: ()) -> CallResult<Address> {
        Ok(ctx.storage.admin().owner)
    }

    fn transfer_ownership(&self, ctx: &mut CallContext<'_>, new_owner: Address) -> CallResult<()> {
        ctx.require_owner()?;
        let previous = ctx.storage.admin().owner;
        ctx.storage.set_owner(new_owner);
        info!(%previous, new = %new_owner, "ownership transferred");
        ctx.emit(Event::OwnershipTransferred {
            previous,
            new: new_owner,
        });
        Ok(())
    }
}

impl Module for OwnershipModule {
    fn name(&self) -> &str {
        "ownership"
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
