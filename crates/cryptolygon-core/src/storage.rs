//! The storage registry shared by every module.
//!
//! One [`Storage`] value lives inside the proxy. It is partitioned into the
//! routing table, the administration state, and any number of named
//! key-value namespaces whose values are bitcode-encoded. Modules own no
//! state outside it, so replacing a module never migrates data.
//!
//! The registry carries a `revision` that advances once per committed call
//! that wrote anything.

use crate::error::{CallError, CallResult};
use crate::id::Address;
use crate::routing::RoutingTable;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Administration namespace: the single designated owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminState {
    pub owner: Address,
}

/// One key-value partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Namespace {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    revision: u64,
    routing: RoutingTable,
    admin: AdminState,
    namespaces: BTreeMap<String, Namespace>,
    #[serde(skip)]
    dirty: bool,
}

impl Storage {
    pub fn new(owner: Address) -> Self {
        Self {
            revision: 0,
            routing: RoutingTable::new(),
            admin: AdminState { owner },
            namespaces: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub(crate) fn replace_routing(&mut self, routing: RoutingTable) {
        self.routing = routing;
        self.dirty = true;
    }

    pub fn admin(&self) -> &AdminState {
        &self.admin
    }

    pub fn set_owner(&mut self, owner: Address) {
        self.admin.owner = owner;
        self.dirty = true;
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Read and decode one value. `Ok(None)` if the key is absent.
    pub fn get<T: DeserializeOwned>(&self, namespace: &str, key: &[u8]) -> CallResult<Option<T>> {
        let Some(raw) = self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.entries.get(key))
        else {
            return Ok(None);
        };
        bitcode::deserialize(raw)
            .map(Some)
            .map_err(|e| CallError::Codec(format!("{namespace}: {e}")))
    }

    pub fn contains(&self, namespace: &str, key: &[u8]) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|ns| ns.entries.contains_key(key))
    }

    /// Encode and write one value, creating the namespace if needed.
    pub fn put<T: Serialize>(&mut self, namespace: &str, key: &[u8], value: &T) -> CallResult<()> {
        let raw =
            bitcode::serialize(value).map_err(|e| CallError::Codec(format!("{namespace}: {e}")))?;
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .entries
            .insert(key.to_vec(), raw);
        self.dirty = true;
        Ok(())
    }

    /// Delete one key. Returns whether it existed.
    pub fn remove(&mut self, namespace: &str, key: &[u8]) -> bool {
        let removed = self
            .namespaces
            .get_mut(namespace)
            .is_some_and(|ns| ns.entries.remove(key).is_some());
        self.dirty |= removed;
        removed
    }

    /// Close out a committed call: advance the revision if anything changed.
    pub(crate) fn commit(&mut self) {
        if self.dirty {
            self.revision += 1;
            self.dirty = false;
        }
    }
}
