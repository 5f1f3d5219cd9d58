//! Module system: independently deployable logic bound to selectors.
//!
//! Modules are stateless code. Every invocation receives a [`CallContext`]
//! borrowing the proxy's storage registry, token service and event log, so
//! a module reads and writes the registry exactly as if it owned it.

use crate::error::{CallError, CallResult};
use crate::event::{Event, EventLog, LogEntry};
use crate::id::{Address, Env, Selector, Timestamp};
use crate::storage::Storage;
use crate::token::MetaCurrency;

// ---------------------------------------------------------------------------
// Module trait
// ---------------------------------------------------------------------------

/// A unit of logic the proxy can route selectors to.
pub trait Module: std::fmt::Debug + Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Every selector this module can handle. A cut may bind any subset.
    fn selectors(&self) -> Vec<Selector>;

    /// Execute one operation in the caller's storage context.
    fn invoke(
        &self,
        ctx: &mut CallContext<'_>,
        selector: Selector,
        data: &[u8],
    ) -> CallResult<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// CallContext
// ---------------------------------------------------------------------------

/// Mutable context passed to a module for the duration of one call.
pub struct CallContext<'a> {
    pub env: Env,
    /// Address of the proxy the call entered through.
    pub this: Address,
    pub storage: &'a mut Storage,
    pub token: &'a mut dyn MetaCurrency,
    pub events: &'a mut EventLog,
}

impl CallContext<'_> {
    pub fn caller(&self) -> Address {
        self.env.caller
    }

    pub fn now(&self) -> Timestamp {
        self.env.timestamp
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(LogEntry {
            caller: self.env.caller,
            timestamp: self.env.timestamp,
            event,
        });
    }

    /// Fail with `NotAuthorized` unless the caller is the designated owner.
    pub fn require_owner(&self) -> CallResult<()> {
        if self.env.caller != self.storage.admin().owner {
            return Err(CallError::NotAuthorized {
                caller: self.env.caller,
            });
        }
        Ok(())
    }

    /// Mint circles with the proxy as the privileged caller.
    pub fn mint(&mut self, to: Address, amount: u128) -> CallResult<()> {
        self.token.mint(self.this, to, amount)?;
        Ok(())
    }

    /// Burn circles with the proxy as the privileged caller.
    pub fn burn(&mut self, from: Address, amount: u128) -> CallResult<()> {
        self.token.burn(self.this, from, amount)?;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
