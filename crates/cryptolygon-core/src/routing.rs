//! The routing table: selector → module bindings plus the per-module
//! reverse index.
//!
//! Both directions are maintained together. Each [`RoutingEntry`] records
//! the selector's position inside its module's selector list, and each
//! module's position in the module list is indexed, so unbinding is O(1)
//! swap-removal in both lists.

use crate::id::{Address, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a selector currently routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub module: Address,
    /// Index of the selector inside the owning module's [`ModuleRecord`].
    position: u32,
}

/// A module and every selector it currently owns. Never empty while stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub module: Address,
    pub selectors: Vec<Selector>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    entries: HashMap<Selector, RoutingEntry>,
    modules: Vec<ModuleRecord>,
    module_index: HashMap<Address, usize>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module_of(&self, selector: Selector) -> Option<Address> {
        self.entries.get(&selector).map(|entry| entry.module)
    }

    pub fn entry(&self, selector: Selector) -> Option<&RoutingEntry> {
        self.entries.get(&selector)
    }

    /// All modules with their selectors, in first-bound order (modified by
    /// swap-removal when a module loses its last selector).
    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn selectors_of(&self, module: Address) -> Option<&[Selector]> {
        self.module_index
            .get(&module)
            .map(|&idx| self.modules[idx].selectors.as_slice())
    }

    pub fn module_addresses(&self) -> Vec<Address> {
        self.modules.iter().map(|record| record.module).collect()
    }

    pub fn owns_anything(&self, module: Address) -> bool {
        self.module_index.contains_key(&module)
    }

    /// Number of bound selectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind an unbound selector. Returns `false` (and changes nothing) if the
    /// selector already has an owner.
    pub(crate) fn bind(&mut self, selector: Selector, module: Address) -> bool {
        if self.entries.contains_key(&selector) {
            return false;
        }
        let idx = match self.module_index.get(&module) {
            Some(&idx) => idx,
            None => {
                self.modules.push(ModuleRecord {
                    module,
                    selectors: Vec::new(),
                });
                let idx = self.modules.len() - 1;
                self.module_index.insert(module, idx);
                idx
            }
        };
        let record = &mut self.modules[idx];
        let position = record.selectors.len() as u32;
        record.selectors.push(selector);
        self.entries
            .insert(selector, RoutingEntry { module, position });
        true
    }

    /// Remove a binding. Returns the previous owner, or `None` if the
    /// selector was unbound.
    pub(crate) fn unbind(&mut self, selector: Selector) -> Option<Address> {
        let entry = self.entries.remove(&selector)?;
        let Some(&idx) = self.module_index.get(&entry.module) else {
            return Some(entry.module);
        };
        let record = &mut self.modules[idx];

        let position = entry.position as usize;
        record.selectors.swap_remove(position);
        if let Some(&moved) = record.selectors.get(position) {
            if let Some(moved_entry) = self.entries.get_mut(&moved) {
                moved_entry.position = position as u32;
            }
        }

        if record.selectors.is_empty() {
            self.modules.swap_remove(idx);
            self.module_index.remove(&entry.module);
            if let Some(moved) = self.modules.get(idx) {
                self.module_index.insert(moved.module, idx);
            }
        }
        Some(entry.module)
    }

    /// Verify that the forward and reverse indexes describe the same
    /// bindings. Returns a description of the first mismatch found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut counted = 0usize;
        for (idx, record) in self.modules.iter().enumerate() {
            if record.selectors.is_empty() {
                return Err(format!("module {} has no selectors", record.module));
            }
            if self.module_index.get(&record.module) != Some(&idx) {
                return Err(format!("module {} has a stale index", record.module));
            }
            for (pos, selector) in record.selectors.iter().enumerate() {
                match self.entries.get(selector) {
                    Some(entry)
                        if entry.module == record.module && entry.position as usize == pos => {}
                    other => {
                        return Err(format!(
                            "selector {selector} listed under {} but routes to {other:?}",
                            record.module
                        ));
                    }
                }
                counted += 1;
            }
        }
        if counted != self.entries.len() {
            return Err(format!(
                "{} entries but {counted} listed selectors",
                self.entries.len()
            ));
        }
        if self.module_index.len() != self.modules.len() {
            return Err("module index size mismatch".to_string());
        }
        Ok(())
    }
}
