//! Cryptolygon Core -- the module-routing proxy for Cryptolygon Idle.
//!
//! Independently deployed logic modules share one persistent storage
//! registry behind a single address-stable proxy, and can be added,
//! replaced or removed without losing state.
//!
//! # Call Pipeline
//!
//! Each call to [`proxy::Proxy::call`] runs these steps:
//!
//! 1. **Checkpoint** -- Clone storage, token ledger and event-log length.
//! 2. **Resolve** -- Intrinsic selectors (cut, loupe) are handled by the
//!    proxy; everything else is looked up in the routing table.
//! 3. **Forward** -- The bound module runs with a [`module::CallContext`]
//!    over the proxy's storage.
//! 4. **Commit or revert** -- Success advances the storage revision;
//!    failure restores the checkpoint and returns the error unchanged.
//!
//! # Key Types
//!
//! - [`proxy::Proxy`] -- Dispatch, transactions, deployment, loupe.
//! - [`module::Module`] -- Trait implemented by every logic module.
//! - [`abi::Router`] -- Selector → typed handler table used by modules.
//! - [`storage::Storage`] -- Namespaced, revisioned key-value registry.
//! - [`routing::RoutingTable`] -- Selector ↔ module bindings.
//! - [`cut::plan_cut`] -- Atomic module-set edits.
//! - [`token::MetaCurrency`] -- The opaque circle balance service.
//! - [`error::CallError`] -- The shared failure taxonomy.

pub mod abi;
pub mod admin;
pub mod cut;
pub mod error;
pub mod event;
pub mod id;
pub mod module;
pub mod proxy;
pub mod routing;
pub mod serialize;
pub mod storage;
pub mod token;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
