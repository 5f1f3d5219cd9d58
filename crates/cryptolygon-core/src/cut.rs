//! The module-set manager: batched edits of the routing table.
//!
//! A cut is a list of [`ModuleCut`] instructions. The whole list is applied
//! to a working copy of the routing table; the copy replaces the live table
//! only if every instruction succeeds, so a failing instruction leaves no
//! trace of the ones before it.

use crate::error::{CallError, CallResult};
use crate::id::{Address, Selector};
use crate::routing::RoutingTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CutAction {
    Add,
    Replace,
    Remove,
}

/// One instruction of a cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCut {
    pub action: CutAction,
    /// Target module. Must be [`Address::ZERO`] for [`CutAction::Remove`].
    pub module: Address,
    pub selectors: Vec<Selector>,
}

impl ModuleCut {
    pub fn add(module: Address, selectors: Vec<Selector>) -> Self {
        Self {
            action: CutAction::Add,
            module,
            selectors,
        }
    }

    pub fn replace(module: Address, selectors: Vec<Selector>) -> Self {
        Self {
            action: CutAction::Replace,
            module,
            selectors,
        }
    }

    pub fn remove(selectors: Vec<Selector>) -> Self {
        Self {
            action: CutAction::Remove,
            module: Address::ZERO,
            selectors,
        }
    }
}

/// A call executed in the proxy's storage context right after a cut is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutInit {
    pub module: Address,
    pub selector: Selector,
    pub data: Vec<u8>,
}

/// Validate `cuts` against `table` and return the resulting table.
///
/// `is_deployed` reports whether code exists at a module address; binding a
/// selector to an address without code fails with `ModuleNotDeployed`.
pub fn plan_cut(
    table: &RoutingTable,
    cuts: &[ModuleCut],
    is_deployed: impl Fn(Address) -> bool,
) -> CallResult<RoutingTable> {
    let mut next = table.clone();

    for cut in cuts {
        if cut.selectors.is_empty() {
            return Err(CallError::invalid(format!(
                "{:?} cut for {} lists no selectors",
                cut.action, cut.module
            )));
        }
        match cut.action {
            CutAction::Add => {
                require_deployed(cut.module, &is_deployed)?;
                for &selector in &cut.selectors {
                    if !next.bind(selector, cut.module) {
                        return Err(CallError::OperationAlreadyBound(selector));
                    }
                }
            }
            CutAction::Replace => {
                require_deployed(cut.module, &is_deployed)?;
                for &selector in &cut.selectors {
                    match next.module_of(selector) {
                        None => return Err(CallError::OperationNotBound(selector)),
                        Some(old) if old == cut.module => {
                            return Err(CallError::NoOpReplace(selector));
                        }
                        Some(_) => {
                            next.unbind(selector);
                            next.bind(selector, cut.module);
                        }
                    }
                }
            }
            CutAction::Remove => {
                if !cut.module.is_zero() {
                    return Err(CallError::invalid(format!(
                        "remove cut must use the zero module address, got {}",
                        cut.module
                    )));
                }
                for &selector in &cut.selectors {
                    if next.unbind(selector).is_none() {
                        return Err(CallError::OperationNotBound(selector));
                    }
                }
            }
        }
    }

    Ok(next)
}

fn require_deployed(module: Address, is_deployed: &impl Fn(Address) -> bool) -> CallResult<()> {
    if module.is_zero() || !is_deployed(module) {
        return Err(CallError::ModuleNotDeployed(module));
    }
    Ok(())
}
