//! Named registries of content collected while rendering
//!
//! Templates register fragments (typically asset paths) into named registries; the
//! page layout reads them back later in priority order.
//!
//! A store is an owned value. Concurrent renders that must not share entries use
//! separate stores; sharing one store across threads requires the caller to wrap it
//! in a lock.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

/// One registered fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    /// Dedup key, present for `once` registrations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
    /// Lower sorts earlier; absent sorts after every explicit priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl RegistryEntry {
    fn sort_key(&self) -> (bool, i64) {
        match self.priority {
            Some(p) => (false, p),
            None => (true, 0),
        }
    }
}

/// Registry name to ordered entries
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    registries: HashMap<String, Vec<RegistryEntry>>,
}

impl RegistryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the registry `name`
    ///
    /// With a `key`, the first registration for that key wins and later ones are
    /// ignored without touching the existing entry. Entries are re-sorted by priority
    /// after every insertion; the sort is stable so ties keep arrival order.
    pub fn register(
        &mut self,
        name: &str,
        value: impl Into<String>,
        key: Option<&str>,
        priority: Option<i64>,
    ) {
        let entries = self.registries.entry(name.to_string()).or_default();

        if let Some(key) = key {
            if entries.iter().any(|e| e.key.as_deref() == Some(key)) {
                debug!(registry = name, key, "skipping duplicate registration");
                return;
            }
        }

        let entry = RegistryEntry {
            key: key.map(str::to_string),
            value: value.into(),
            priority,
        };
        debug!(registry = name, value = %entry.value, ?priority, "registered entry");
        entries.push(entry);
        entries.sort_by_key(RegistryEntry::sort_key);
    }

    /// Register content keyed by itself, so it is only stored once
    pub fn register_once(&mut self, name: &str, value: &str, priority: Option<i64>) {
        self.register(name, value, Some(value), priority);
    }

    /// Entries of a registry in sorted order; empty for unknown names
    pub fn entries(&self, name: &str) -> &[RegistryEntry] {
        self.registries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Values of a registry in sorted order
    pub fn read(&self, name: &str) -> Vec<&str> {
        self.entries(name).iter().map(|e| e.value.as_str()).collect()
    }

    /// Value registered under `key`
    pub fn get(&self, name: &str, key: &str) -> Option<&str> {
        self.entries(name)
            .iter()
            .find(|e| e.key.as_deref() == Some(key))
            .map(|e| e.value.as_str())
    }

    /// Names of all registries, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.registries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.registries.values().all(Vec::is_empty)
    }

    /// Drop every registry
    pub fn clear(&mut self) {
        debug!(registries = self.registries.len(), "clearing registry store");
        self.registries.clear();
    }
}
