//! Cluster-wide static name resolution table.
//!
//! Every node records its address here once created. The external writer then
//! pushes the rendered table into the host's resolver file, so a node can reach
//! any peer registered before it by machine name.

use crate::error::NameTableError;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct HostsLookupTable {
    entries: Mutex<BTreeMap<String, String>>,
}

impl HostsLookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name -> address`.
    ///
    /// Idempotent for the same address; a different address under an existing
    /// name is rejected and leaves the table untouched.
    pub fn record(&self, name: &str, address: &str) -> Result<(), NameTableError> {
        let mut entries = self.lock();
        match entries.get(name) {
            Some(existing) if existing == address => Ok(()),
            Some(existing) => Err(NameTableError::Conflict {
                name: name.to_string(),
                existing: existing.clone(),
                requested: address.to_string(),
            }),
            None => {
                entries.insert(name.to_string(), address.to_string());
                tracing::debug!("[HostsLookupTable] Recorded {} -> {}", name, address);
                Ok(())
            }
        }
    }

    /// Drop `name` if it still maps to `address`. Returns whether an entry
    /// was removed; an entry re-recorded under another address is kept.
    pub fn remove(&self, name: &str, address: &str) -> bool {
        let mut entries = self.lock();
        if entries.get(name).map(String::as_str) != Some(address) {
            return false;
        }
        entries.remove(name);
        tracing::debug!("[HostsLookupTable] Removed {} -> {}", name, address);
        true
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    /// Snapshot of all entries, ordered by name.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.lock()
            .iter()
            .map(|(name, address)| (name.clone(), address.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Hosts-file lines (`<address>\t<name>`), one per entry.
    pub fn render(&self) -> String {
        self.lock()
            .iter()
            .map(|(name, address)| format!("{}\t{}\n", address, name))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
