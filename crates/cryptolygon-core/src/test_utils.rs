//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`, like the other
//! crates' helpers.

use crate::abi::{self, Operation, Router};
use crate::cut::ModuleCut;
use crate::error::{CallError, CallResult};
use crate::event::Event;
use crate::id::{Address, Env, Selector, Timestamp};
use crate::module::{CallContext, Module};
use crate::proxy::Proxy;
use crate::storage::Storage;
use crate::token::CircleToken;
use std::sync::Arc;

// ===========================================================================
// Addresses
// ===========================================================================

pub fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

pub fn owner() -> Address {
    addr(1)
}

pub fn proxy_address() -> Address {
    addr(0xD1A0)
}

pub fn token_address() -> Address {
    addr(0xC1C1)
}

pub fn owner_env(timestamp: Timestamp) -> Env {
    Env::new(owner(), timestamp)
}

pub fn storage_owned_by(owner: Address) -> Storage {
    Storage::new(owner)
}

/// A proxy owned by [`owner`] with an empty routing table and a fresh
/// circle token that has the proxy as minter.
pub fn new_proxy() -> Proxy {
    let token = CircleToken::new(token_address(), proxy_address());
    Proxy::new(proxy_address(), owner(), Box::new(token))
}

// ===========================================================================
// CounterModule
// ===========================================================================

pub const INCREMENT: Operation = Operation::new("counter.increment(u64)");
pub const COUNTER_NAMESPACE: &str = "counter";

/// Adds its argument to a shared counter in the `counter` namespace. The
/// write and an event happen before the overflow check so rollback is
/// observable.
#[derive(Debug)]
pub struct CounterModule {
    router: Router<Self>,
}

impl Default for CounterModule {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterModule {
    pub fn new() -> Self {
        Self {
            router: Router::new().route(INCREMENT, Self::increment),
        }
    }

    fn increment(&self, ctx: &mut CallContext<'_>, amount: u64) -> CallResult<u64> {
        let current: u64 = ctx.storage.get(COUNTER_NAMESPACE, b"value")?.unwrap_or(0);
        let next = current.wrapping_add(amount);
        ctx.storage.put(COUNTER_NAMESPACE, b"value", &next)?;
        ctx.emit(Event::Custom {
            topic: "counter".to_string(),
            payload: next.to_le_bytes().to_vec(),
        });
        if next < current {
            return Err(CallError::invalid("counter overflow"));
        }
        Ok(next)
    }
}

impl Module for CounterModule {
    fn name(&self) -> &str {
        "counter"
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

/// Deploy a [`CounterModule`] and bind its selector. Returns its address.
pub fn bind_counter(proxy: &mut Proxy) -> Address {
    let module = proxy.deploy(Arc::new(CounterModule::new()));
    if let Err(err) = proxy.cut(
        owner_env(0),
        vec![ModuleCut::add(module, vec![INCREMENT.selector()])],
        None,
    ) {
        panic!("binding counter failed: {err}");
    }
    module
}

pub fn increment(proxy: &mut Proxy, caller: Address, amount: u64) -> CallResult<u64> {
    let data = abi::encode(&amount)?;
    let raw = proxy.call(Env::new(caller, 0), INCREMENT.selector(), &data)?;
    abi::decode(&raw)
}

pub fn counter_value(proxy: &Proxy) -> u64 {
    proxy
        .storage()
        .get(COUNTER_NAMESPACE, b"value")
        .ok()
        .flatten()
        .unwrap_or(0)
}
