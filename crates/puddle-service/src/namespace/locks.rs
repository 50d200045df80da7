//! Per-puddle mutual exclusion for structural mutations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use puddle_core::types::path;

/// One async mutex per puddle root (`<uid>/`).
///
/// Structural mutations lock every root they touch. Roots are acquired in
/// sorted order so two operations spanning the same pair of puddles cannot
/// deadlock.
#[derive(Debug, Default)]
pub struct NamespaceLocks {
    roots: DashMap<String, Arc<Mutex<()>>>,
}

/// Holds the root locks until dropped.
#[derive(Debug)]
pub struct NamespaceGuard {
    roots: Vec<String>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl NamespaceGuard {
    /// Roots held by this guard, sorted.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }
}

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the puddle roots containing each of `paths`.
    pub async fn lock(&self, paths: &[&str]) -> NamespaceGuard {
        let mut roots: Vec<String> = paths.iter().map(|p| path::puddle_root(p)).collect();
        roots.sort();
        roots.dedup();

        let mut guards = Vec::with_capacity(roots.len());
        for root in &roots {
            let mutex = self.roots.entry(root.clone()).or_default().clone();
            guards.push(mutex.lock_owned().await);
        }
        NamespaceGuard {
            roots,
            _guards: guards,
        }
    }

    /// Forgets the mutex of `root` when nobody holds or waits on it.
    pub fn release(&self, root: &str) -> bool {
        self.roots
            .remove_if(root, |_, mutex| Arc::strong_count(mutex) == 1)
            .is_some()
    }

    /// Number of roots with a live mutex.
    pub fn tracked(&self) -> usize {
        self.roots.len()
    }
}
