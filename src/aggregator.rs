//! Concurrent result aggregation.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::Domain;

/// Set of discovered domains shared by all search tasks.
///
/// Inserts are atomic per key, so a domain found by many tasks is counted
/// once. The set is read in full only after every task has finished.
#[derive(Debug, Default)]
pub struct ResultSink {
    domains: Mutex<HashSet<Domain>>,
}

impl ResultSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Domain>> {
        // A panicking writer cannot leave a HashSet half-inserted
        self.domains.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts a domain, returning true if it was not present yet.
    pub fn insert(&self, domain: Domain) -> bool {
        self.lock().insert(domain)
    }

    /// Inserts every domain, returning how many were new.
    pub fn extend(&self, domains: impl IntoIterator<Item = Domain>) -> usize {
        let mut set = self.lock();
        domains
            .into_iter()
            .filter(|domain| set.insert(domain.clone()))
            .count()
    }

    /// Returns true if the domain has been discovered.
    pub fn contains(&self, domain: &Domain) -> bool {
        self.lock().contains(domain)
    }

    /// Returns the number of distinct domains.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether nothing has been discovered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns all domains in sorted order.
    pub fn sorted(&self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self.lock().iter().cloned().collect();
        domains.sort();
        domains
    }

    /// Consumes the sink, returning all domains in sorted order.
    pub fn into_sorted(self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self
            .domains
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .into_iter()
            .collect();
        domains.sort();
        domains
    }
}
