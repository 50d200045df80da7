//! In-memory entry store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use puddle_core::result::AppResult;
use puddle_core::types::{UserId, path};
use puddle_entity::drop::{Drop, NewDrop};

use super::{rebase_keys, scoped_keys};
use crate::store::EntryStore;

/// [`EntryStore`] over a path-ordered map.
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    drops: RwLock<BTreeMap<String, Drop>>,
}

impl MemoryEntryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn get(&self, path: &str) -> AppResult<Option<Drop>> {
        Ok(self.drops.read().await.get(path).cloned())
    }

    async fn create(&self, drop: NewDrop) -> AppResult<bool> {
        let mut drops = self.drops.write().await;
        if drops.contains_key(&drop.path) {
            return Ok(false);
        }
        drops.insert(drop.path.clone(), Drop::from_new(drop));
        Ok(true)
    }

    async fn create_many(&self, new_drops: Vec<NewDrop>) -> AppResult<u64> {
        let mut drops = self.drops.write().await;
        let mut created = 0;
        for drop in new_drops {
            if !drops.contains_key(&drop.path) {
                drops.insert(drop.path.clone(), Drop::from_new(drop));
                created += 1;
            }
        }
        Ok(created)
    }

    async fn list_subtree(&self, target: &str) -> AppResult<Vec<Drop>> {
        if !path::is_directory(target) {
            return Ok(Vec::new());
        }
        let drops = self.drops.read().await;
        Ok(scoped_keys(&drops, target)
            .iter()
            .filter_map(|key| drops.get(key).cloned())
            .collect())
    }

    async fn rename(
        &self,
        old_path: &str,
        new_path: &str,
        editor: &UserId,
        new_owner: &UserId,
    ) -> AppResult<u64> {
        let mut drops = self.drops.write().await;
        let moved = rebase_keys(&mut drops, old_path, new_path);

        let now = Utc::now();
        for key in &moved {
            if let Some(drop) = drops.get_mut(key) {
                drop.path.clone_from(key);
                drop.last_edited_by = editor.clone();
                drop.last_edited_at = now;
                drop.owner_id = new_owner.clone();
            }
        }
        Ok(moved.len() as u64)
    }

    async fn delete(&self, target: &str) -> AppResult<u64> {
        let mut drops = self.drops.write().await;
        let keys = scoped_keys(&drops, target);
        for key in &keys {
            drops.remove(key);
        }
        Ok(keys.len() as u64)
    }
}
