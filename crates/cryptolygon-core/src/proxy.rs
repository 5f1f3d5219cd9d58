//! The routing proxy: one stable entry point in front of every module.
//!
//! # Dispatch
//!
//! Every call enters [`Proxy::call`] with a selector and encoded arguments.
//! The proxy's own intrinsic operations (the cut and the four loupe
//! queries) are handled directly; any other selector is looked up in the
//! routing table and forwarded to the bound module together with a
//! [`CallContext`] over the proxy's storage. Unbound selectors fail with
//! `UnknownOperation`.
//!
//! # Transactions
//!
//! Each top-level call is all-or-nothing. The proxy checkpoints storage,
//! the token ledger and the event log before running the call and restores
//! all three if it fails. Checkpointing clones the registry, so its cost
//! grows with the number of players.

use crate::abi::{self, Operation};
use crate::cut::{CutAction, CutInit, ModuleCut, plan_cut};
use crate::error::{CallError, CallResult};
use crate::event::{Event, EventLog, LogEntry};
use crate::id::{Address, Env, Selector};
use crate::module::{CallContext, Module};
use crate::routing::ModuleRecord;
use crate::serialize::{self, SnapshotError};
use crate::storage::Storage;
use crate::token::MetaCurrency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Intrinsic operations
// ---------------------------------------------------------------------------

pub const CUT: Operation =
    Operation::new("proxy.cut((u8,address,bytes4[])[],(address,bytes4,bytes)?)");
pub const LOUPE_MODULES: Operation = Operation::new("loupe.modules()");
pub const LOUPE_MODULE_SELECTORS: Operation = Operation::new("loupe.module_selectors(address)");
pub const LOUPE_MODULE_ADDRESSES: Operation = Operation::new("loupe.module_addresses()");
pub const LOUPE_MODULE_OF: Operation = Operation::new("loupe.module_of(bytes4)");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intrinsic {
    Cut,
    Modules,
    ModuleSelectors,
    ModuleAddresses,
    ModuleOf,
}

/// Arguments of the intrinsic cut operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutRequest {
    pub cuts: Vec<ModuleCut>,
    pub init: Option<CutInit>,
}

// ---------------------------------------------------------------------------
// Proxy
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Proxy {
    address: Address,
    storage: Storage,
    token: Box<dyn MetaCurrency>,
    events: EventLog,
    /// Code deployed on the host, keyed by address. Binding is separate.
    deployed: BTreeMap<Address, Arc<dyn Module>>,
    deploy_nonce: u64,
    intrinsics: Vec<(Selector, Intrinsic)>,
}

impl Proxy {
    /// Create a proxy with an empty routing table. `token` must already
    /// recognize `address` as its minter.
    pub fn new(address: Address, owner: Address, token: Box<dyn MetaCurrency>) -> Self {
        let intrinsics = vec![
            (CUT.selector(), Intrinsic::Cut),
            (LOUPE_MODULES.selector(), Intrinsic::Modules),
            (LOUPE_MODULE_SELECTORS.selector(), Intrinsic::ModuleSelectors),
            (LOUPE_MODULE_ADDRESSES.selector(), Intrinsic::ModuleAddresses),
            (LOUPE_MODULE_OF.selector(), Intrinsic::ModuleOf),
        ];
        Self {
            address,
            storage: Storage::new(owner),
            token,
            events: EventLog::new(),
            deployed: BTreeMap::new(),
            deploy_nonce: 0,
            intrinsics,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn token(&self) -> &dyn MetaCurrency {
        self.token.as_ref()
    }

    /// Direct access to the token for holder-initiated operations
    /// (transfers, approvals) that do not go through the game.
    pub fn token_mut(&mut self) -> &mut dyn MetaCurrency {
        self.token.as_mut()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LogEntry> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Deployment
    // -----------------------------------------------------------------------

    /// Place module code on the host and return its address. The module
    /// handles nothing until a cut binds its selectors.
    pub fn deploy(&mut self, module: Arc<dyn Module>) -> Address {
        let address = Address::derive(self.address, self.deploy_nonce);
        self.deploy_nonce += 1;
        debug!(module = module.name(), %address, "module deployed");
        self.deployed.insert(address, module);
        address
    }

    pub fn deployed(&self, address: Address) -> Option<&Arc<dyn Module>> {
        self.deployed.get(&address)
    }

    // -----------------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------------

    /// Execute one top-level call. On error every state change is undone.
    pub fn call(&mut self, env: Env, selector: Selector, data: &[u8]) -> CallResult<Vec<u8>> {
        self.transact(env, selector, |proxy| proxy.execute(env, selector, data))
    }

    /// Apply a cut and run its optional initializer as one transaction.
    pub fn cut(&mut self, env: Env, cuts: Vec<ModuleCut>, init: Option<CutInit>) -> CallResult<()> {
        self.transact(env, CUT.selector(), |proxy| {
            proxy.apply_cut(env, cuts, init)
        })
    }

    fn transact<T>(
        &mut self,
        env: Env,
        selector: Selector,
        f: impl FnOnce(&mut Self) -> CallResult<T>,
    ) -> CallResult<T> {
        let storage_checkpoint = self.storage.clone();
        let token_checkpoint = self.token.boxed_clone();
        let events_mark = self.events.len();

        debug!(caller = %env.caller, %selector, timestamp = env.timestamp, "dispatch");
        let result = f(self);
        match &result {
            Ok(_) => self.storage.commit(),
            Err(err) => {
                debug!(caller = %env.caller, %selector, error = %err, "call reverted");
                self.storage = storage_checkpoint;
                self.token = token_checkpoint;
                self.events.truncate(events_mark);
            }
        }
        result
    }

    fn execute(&mut self, env: Env, selector: Selector, data: &[u8]) -> CallResult<Vec<u8>> {
        if let Some(intrinsic) = self.intrinsic(selector) {
            return self.execute_intrinsic(env, intrinsic, data);
        }
        let module_address = self
            .storage
            .routing()
            .module_of(selector)
            .ok_or(CallError::UnknownOperation(selector))?;
        let module = self
            .deployed
            .get(&module_address)
            .cloned()
            .ok_or(CallError::ModuleNotDeployed(module_address))?;
        self.invoke_module(env, module.as_ref(), selector, data)
    }

    fn intrinsic(&self, selector: Selector) -> Option<Intrinsic> {
        self.intrinsics
            .iter()
            .find(|(s, _)| *s == selector)
            .map(|&(_, intrinsic)| intrinsic)
    }

    fn execute_intrinsic(
        &mut self,
        env: Env,
        intrinsic: Intrinsic,
        data: &[u8],
    ) -> CallResult<Vec<u8>> {
        match intrinsic {
            Intrinsic::Cut => {
                let request: CutRequest = abi::decode(data)?;
                self.apply_cut(env, request.cuts, request.init)?;
                abi::encode(&())
            }
            Intrinsic::Modules => abi::encode(&self.modules().to_vec()),
            Intrinsic::ModuleSelectors => {
                let module: Address = abi::decode(data)?;
                abi::encode(&self.module_selectors(module))
            }
            Intrinsic::ModuleAddresses => abi::encode(&self.module_addresses()),
            Intrinsic::ModuleOf => {
                let selector: Selector = abi::decode(data)?;
                abi::encode(&self.module_of(selector))
            }
        }
    }

    fn invoke_module(
        &mut self,
        env: Env,
        module: &dyn Module,
        selector: Selector,
        data: &[u8],
    ) -> CallResult<Vec<u8>> {
        let mut ctx = CallContext {
            env,
            this: self.address,
            storage: &mut self.storage,
            token: self.token.as_mut(),
            events: &mut self.events,
        };
        module.invoke(&mut ctx, selector, data)
    }

    fn apply_cut(&mut self, env: Env, cuts: Vec<ModuleCut>, init: Option<CutInit>) -> CallResult<()> {
        if env.caller != self.storage.admin().owner {
            return Err(CallError::NotAuthorized { caller: env.caller });
        }

        // Intrinsics are always dispatched first, so a binding would be dead.
        if let Some(&selector) = cuts
            .iter()
            .filter(|cut| cut.action != CutAction::Remove)
            .flat_map(|cut| &cut.selectors)
            .find(|&&selector| self.intrinsic(selector).is_some())
        {
            return Err(CallError::OperationAlreadyBound(selector));
        }

        let deployed = &self.deployed;
        let next = plan_cut(self.storage.routing(), &cuts, |address| {
            deployed.contains_key(&address)
        })?;
        self.storage.replace_routing(next);
        info!(
            instructions = cuts.len(),
            bound = self.storage.routing().len(),
            "module set changed"
        );

        let init_module = match init {
            Some(init) => {
                let module = self
                    .deployed
                    .get(&init.module)
                    .cloned()
                    .ok_or(CallError::ModuleNotDeployed(init.module))?;
                self.invoke_module(env, module.as_ref(), init.selector, &init.data)?;
                Some(init.module)
            }
            None => None,
        };

        self.events.push(LogEntry {
            caller: env.caller,
            timestamp: env.timestamp,
            event: Event::ModuleSetChanged {
                cuts,
                init: init_module,
            },
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Loupe
    // -----------------------------------------------------------------------

    pub fn modules(&self) -> &[ModuleRecord] {
        self.storage.routing().modules()
    }

    pub fn module_selectors(&self, module: Address) -> Vec<Selector> {
        self.storage
            .routing()
            .selectors_of(module)
            .map(<[Selector]>::to_vec)
            .unwrap_or_default()
    }

    pub fn module_addresses(&self) -> Vec<Address> {
        self.storage.routing().module_addresses()
    }

    pub fn module_of(&self, selector: Selector) -> Option<Address> {
        self.storage.routing().module_of(selector)
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Serialize the storage registry. Deployed code and the token ledger
    /// are host state and are not included.
    pub fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        serialize::encode_storage(&self.storage)
    }

    /// Replace the storage registry with a previously taken snapshot.
    pub fn restore(&mut self, data: &[u8]) -> Result<(), SnapshotError> {
        self.storage = serialize::decode_storage(data)?;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
