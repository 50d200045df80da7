//! In-memory watch store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use puddle_core::result::AppResult;
use puddle_core::types::{UserId, path};
use puddle_entity::watch::Watch;

use super::{rebase_keys, scoped_keys};
use crate::store::WatchStore;

type Watchers = BTreeMap<UserId, DateTime<Utc>>;

/// [`WatchStore`] keyed by path, then user.
#[derive(Debug, Default)]
pub struct MemoryWatchStore {
    watches: RwLock<BTreeMap<String, Watchers>>,
}

impl MemoryWatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_watch(path: &str, user_id: &UserId, created_at: &DateTime<Utc>) -> Watch {
    Watch {
        user_id: user_id.clone(),
        path: path.to_string(),
        created_at: *created_at,
    }
}

#[async_trait]
impl WatchStore for MemoryWatchStore {
    async fn add(&self, user_id: &UserId, path: &str) -> AppResult<bool> {
        let mut watches = self.watches.write().await;
        let watchers = watches.entry(path.to_string()).or_default();
        if watchers.contains_key(user_id) {
            return Ok(false);
        }
        watchers.insert(user_id.clone(), Utc::now());
        Ok(true)
    }

    async fn remove(&self, user_id: &UserId, path: &str) -> AppResult<bool> {
        let mut watches = self.watches.write().await;
        let Some(watchers) = watches.get_mut(path) else {
            return Ok(false);
        };
        let removed = watchers.remove(user_id).is_some();
        if watchers.is_empty() {
            watches.remove(path);
        }
        Ok(removed)
    }

    async fn remove_all_for_path(&self, target: &str) -> AppResult<Vec<Watch>> {
        let mut watches = self.watches.write().await;
        let mut removed = Vec::new();
        for key in scoped_keys(&watches, target) {
            if let Some(watchers) = watches.remove(&key) {
                removed.extend(watchers.iter().map(|(u, at)| to_watch(&key, u, at)));
            }
        }
        Ok(removed)
    }

    async fn remove_all_for_user(&self, user_id: &UserId) -> AppResult<Vec<Watch>> {
        let mut watches = self.watches.write().await;
        let mut removed = Vec::new();
        watches.retain(|path, watchers| {
            if let Some(at) = watchers.remove(user_id) {
                removed.push(to_watch(path, user_id, &at));
            }
            !watchers.is_empty()
        });
        Ok(removed)
    }

    async fn list(&self, user_id: &UserId) -> AppResult<Vec<Watch>> {
        let watches = self.watches.read().await;
        Ok(watches
            .iter()
            .filter_map(|(path, watchers)| watchers.get(user_id).map(|at| to_watch(path, user_id, at)))
            .collect())
    }

    async fn list_watchers(&self, path: &str) -> AppResult<Vec<Watch>> {
        let watches = self.watches.read().await;
        Ok(watches
            .get(path)
            .map(|watchers| watchers.iter().map(|(u, at)| to_watch(path, u, at)).collect())
            .unwrap_or_default())
    }

    async fn list_subtree(&self, target: &str) -> AppResult<Vec<Watch>> {
        let watches = self.watches.read().await;
        let mut found = Vec::new();
        for key in scoped_keys(&watches, target) {
            if let Some(watchers) = watches.get(&key) {
                found.extend(watchers.iter().map(|(u, at)| to_watch(&key, u, at)));
            }
        }
        Ok(found)
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> AppResult<u64> {
        let mut watches = self.watches.write().await;
        if !path::is_within(new_path, old_path) {
            for stale in scoped_keys(&watches, new_path) {
                watches.remove(&stale);
            }
        }
        let moved = rebase_keys(&mut watches, old_path, new_path);
        Ok(moved
            .iter()
            .filter_map(|key| watches.get(key))
            .map(|watchers| watchers.len() as u64)
            .sum())
    }
}
