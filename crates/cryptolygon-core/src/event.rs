//! Append-only event log.
//!
//! Events emitted during a call are appended to the proxy's [`EventLog`].
//! If the call fails the log is truncated back to its length before the
//! call, so observers only ever see events from committed calls.

use crate::cut::ModuleCut;
use crate::id::{Address, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// The routing table changed. `init` is the initializer module, if one ran.
    ModuleSetChanged {
        cuts: Vec<ModuleCut>,
        init: Option<Address>,
    },
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
    /// A module-defined event. `topic` names the emitter's event family and
    /// `payload` is whatever encoding that module chose.
    Custom { topic: String, payload: Vec<u8> },
}

/// An event plus the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub caller: Address,
    pub timestamp: Timestamp,
    pub event: Event,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard every entry at or after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Remove and return every entry.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn iter_custom<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.entries.iter().filter_map(move |entry| match &entry.event {
            Event::Custom { topic: t, payload } if t == topic => Some(payload.as_slice()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(topic: &str) -> LogEntry {
        LogEntry {
            caller: Address::ZERO,
            timestamp: 0,
            event: Event::Custom {
                topic: topic.to_string(),
                payload: vec![1],
            },
        }
    }

    #[test]
    fn truncate_discards_tail() {
        let mut log = EventLog::new();
        log.push(entry("a"));
        let mark = log.len();
        log.push(entry("b"));
        log.push(entry("c"));
        log.truncate(mark);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn iter_custom_filters_by_topic() {
        let mut log = EventLog::new();
        log.push(entry("game"));
        log.push(entry("other"));
        log.push(entry("game"));
        assert_eq!(log.iter_custom("game").count(), 2);
        assert_eq!(log.drain().len(), 3);
        assert!(log.is_empty());
    }
}
