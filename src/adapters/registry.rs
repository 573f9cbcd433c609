// src/adapters/registry.rs
//! Named set of adapters plus the run policy for each.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use super::types::SourceAdapter;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const UNRELIABLE_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
pub const UNRELIABLE_ATTEMPTS: u32 = 3;

/// How the orchestrator runs one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterPolicy {
    /// Deadline for each attempt.
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl AdapterPolicy {
    /// One attempt, no retry.
    pub fn standard(timeout: Duration) -> Self {
        Self {
            timeout,
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// For stores that fail intermittently: several attempts with a fixed back-off.
    pub fn unreliable(timeout: Duration, backoff: Duration) -> Self {
        Self {
            timeout,
            max_attempts: UNRELIABLE_ATTEMPTS,
            backoff,
        }
    }

    /// Worst-case time one adapter can occupy a pool slot.
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        self.timeout * attempts + self.backoff * (attempts - 1)
    }
}

impl Default for AdapterPolicy {
    fn default() -> Self {
        Self::standard(DEFAULT_TIMEOUT)
    }
}

#[derive(Clone)]
pub struct RegisteredAdapter {
    pub adapter: Arc<dyn SourceAdapter>,
    pub policy: AdapterPolicy,
}

/// Adapters keyed by store name. Adding a store never touches orchestration code.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    entries: BTreeMap<String, RegisteredAdapter>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an adapter under its own name.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>, policy: AdapterPolicy) {
        let name = adapter.name().to_string();
        self.entries
            .insert(name, RegisteredAdapter { adapter, policy });
    }

    pub fn with(mut self, adapter: Arc<dyn SourceAdapter>, policy: AdapterPolicy) -> Self {
        self.register(adapter, policy);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredAdapter> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegisteredAdapter)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subset for one search. An empty selection means every store.
    /// Names match case-insensitively; unknown names are logged and skipped.
    pub fn select(&self, stores: &BTreeSet<String>) -> AdapterRegistry {
        if stores.is_empty() {
            return self.clone();
        }
        let mut out = AdapterRegistry::new();
        for wanted in stores {
            match self
                .entries
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(wanted.trim()))
            {
                Some((name, reg)) => {
                    out.entries.insert(name.clone(), reg.clone());
                }
                None => tracing::warn!(target: "orchestrator", store = %wanted, "unknown store ignored"),
            }
        }
        out
    }
}
