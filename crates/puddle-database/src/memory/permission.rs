//! In-memory permission store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use puddle_core::result::AppResult;
use puddle_core::types::{GrantFilter, GrantKind, PermissionKind, UserId, path};
use puddle_entity::permission::PermissionGrant;

use super::{rebase_keys, scoped_keys};
use crate::store::{EntryStore, PermissionStore};

type Grantees = BTreeSet<(UserId, PermissionKind)>;

/// [`PermissionStore`] keyed by path. Grants are materialised onto the drops
/// the paired [`EntryStore`] currently holds.
#[derive(Debug)]
pub struct MemoryPermissionStore {
    entries: Arc<dyn EntryStore>,
    grants: RwLock<BTreeMap<String, Grantees>>,
}

impl MemoryPermissionStore {
    /// Create an empty store that expands grants over `entries`.
    pub fn new(entries: Arc<dyn EntryStore>) -> Self {
        Self {
            entries,
            grants: RwLock::new(BTreeMap::new()),
        }
    }

    async fn materialisation_targets(&self, target: &str) -> AppResult<Vec<String>> {
        if path::is_directory(target) {
            Ok(self
                .entries
                .list_subtree(target)
                .await?
                .into_iter()
                .map(|drop| drop.path)
                .collect())
        } else if self.entries.exists(target).await? {
            Ok(vec![target.to_string()])
        } else {
            Ok(Vec::new())
        }
    }
}

fn rows(path: &str, grantees: &Grantees) -> impl Iterator<Item = PermissionGrant> {
    grantees
        .iter()
        .map(move |(user_id, kind)| PermissionGrant::new(path, user_id.clone(), *kind))
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn check(
        &self,
        path: &str,
        user_id: &UserId,
        kind: PermissionKind,
    ) -> AppResult<Option<PermissionGrant>> {
        let grants = self.grants.read().await;
        let key = (user_id.clone(), kind);
        Ok(grants
            .get(path)
            .filter(|grantees| grantees.contains(&key))
            .map(|_| PermissionGrant::new(path, user_id.clone(), kind)))
    }

    async fn list(&self, filter: &GrantFilter) -> AppResult<Vec<PermissionGrant>> {
        let grants = self.grants.read().await;
        Ok(grants
            .get(&filter.path)
            .map(|grantees| {
                rows(&filter.path, grantees)
                    .filter(|g| filter.matches_grantee(&g.user_id, g.kind))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_subtree(&self, target: &str) -> AppResult<Vec<PermissionGrant>> {
        let grants = self.grants.read().await;
        Ok(scoped_keys(&grants, target)
            .iter()
            .filter_map(|key| grants.get(key).map(|grantees| rows(key, grantees).collect::<Vec<_>>()))
            .flatten()
            .collect())
    }

    async fn grant(
        &self,
        target: &str,
        user_id: &UserId,
        kind: GrantKind,
    ) -> AppResult<Vec<PermissionGrant>> {
        let targets = self.materialisation_targets(target).await?;
        let mut grants = self.grants.write().await;
        let mut created = Vec::new();
        for stored in kind.expand() {
            for path in &targets {
                let inserted = grants
                    .entry(path.clone())
                    .or_default()
                    .insert((user_id.clone(), *stored));
                if inserted {
                    created.push(PermissionGrant::new(path.as_str(), user_id.clone(), *stored));
                }
            }
        }
        Ok(created)
    }

    async fn revoke(&self, filter: &GrantFilter) -> AppResult<Vec<PermissionGrant>> {
        let mut grants = self.grants.write().await;
        let mut removed = Vec::new();
        for key in scoped_keys(&grants, &filter.path) {
            let Some(grantees) = grants.get_mut(&key) else {
                continue;
            };
            grantees.retain(|(user_id, kind)| {
                let hit = filter.matches_grantee(user_id, *kind);
                if hit {
                    removed.push(PermissionGrant::new(key.as_str(), user_id.clone(), *kind));
                }
                !hit
            });
            if grantees.is_empty() {
                grants.remove(&key);
            }
        }
        Ok(removed)
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> AppResult<Vec<PermissionGrant>> {
        let mut grants = self.grants.write().await;
        let mut removed = Vec::new();
        grants.retain(|path, grantees| {
            grantees.retain(|(holder, kind)| {
                let hit = holder == user_id;
                if hit {
                    removed.push(PermissionGrant::new(path.as_str(), holder.clone(), *kind));
                }
                !hit
            });
            !grantees.is_empty()
        });
        Ok(removed)
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> AppResult<u64> {
        let mut grants = self.grants.write().await;
        if !path::is_within(new_path, old_path) {
            for stale in scoped_keys(&grants, new_path) {
                grants.remove(&stale);
            }
        }
        let moved = rebase_keys(&mut grants, old_path, new_path);
        Ok(moved
            .iter()
            .filter_map(|key| grants.get(key))
            .map(|grantees| grantees.len() as u64)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntryStore;
    use puddle_entity::drop::NewDrop;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    async fn seeded() -> (Arc<dyn EntryStore>, MemoryPermissionStore) {
        let entries: Arc<dyn EntryStore> = Arc::new(MemoryEntryStore::new());
        for p in ["a/", "a/d/", "a/d/f", "a/d/e/", "a/g"] {
            entries
                .create(NewDrop::new(p, uid("a"), uid("a")))
                .await
                .expect("create");
        }
        let store = MemoryPermissionStore::new(Arc::clone(&entries));
        (entries, store)
    }

    #[tokio::test]
    async fn test_grant_all_materialises_subtree_once() {
        let (_, store) = seeded().await;
        let created = store.grant("a/d/", &uid("b"), GrantKind::All).await.expect("grant");
        assert_eq!(created.len(), 9);

        let again = store.grant("a/d/", &uid("b"), GrantKind::All).await.expect("grant");
        assert!(again.is_empty());

        let listed = store
            .list(&GrantFilter::on("a/d/").user(uid("b")))
            .await
            .expect("list");
        let kinds: Vec<_> = listed.iter().map(|g| g.kind).collect();
        assert_eq!(kinds, PermissionKind::ALL.to_vec());
        assert!(store.check("a/g", &uid("b"), PermissionKind::Read).await.expect("check").is_none());
        assert!(store.check("a/d/f", &uid("b"), PermissionKind::Modify).await.expect("check").is_some());
    }

    #[tokio::test]
    async fn test_grant_on_missing_path_is_noop() {
        let (_, store) = seeded().await;
        let created = store.grant("a/nope", &uid("b"), GrantKind::Read).await.expect("grant");
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn test_revoke_wildcards_and_scope() {
        let (_, store) = seeded().await;
        store.grant("a/", &uid("a"), GrantKind::All).await.expect("grant");
        store.grant("a/d/", &uid("b"), GrantKind::Read).await.expect("grant");

        let removed = store
            .revoke(&GrantFilter::on("a/d/").user(uid("b")))
            .await
            .expect("revoke");
        assert_eq!(removed.len(), 3);
        assert_eq!(store.list_subtree("a/d/").await.expect("list").len(), 9);

        let removed = store.revoke(&GrantFilter::on("a/d/")).await.expect("revoke");
        assert_eq!(removed.len(), 9);
        assert_eq!(store.list_subtree("a/").await.expect("list").len(), 6);
    }

    #[tokio::test]
    async fn test_rename_rebases_leading_prefix() {
        let (_, store) = seeded().await;
        store.grant("a/d/", &uid("b"), GrantKind::Read).await.expect("grant");
        let moved = store.rename("a/d/", "a/x/").await.expect("rename");
        assert_eq!(moved, 3);
        assert!(store.list(&GrantFilter::on("a/d/")).await.expect("list").is_empty());
        assert_eq!(store.list(&GrantFilter::on("a/x/e/")).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let (_, store) = seeded().await;
        store.grant("a/", &uid("a"), GrantKind::Write).await.expect("grant");
        store.grant("a/d/", &uid("b"), GrantKind::Write).await.expect("grant");
        let removed = store.revoke_all_for_user(&uid("b")).await.expect("revoke");
        assert_eq!(removed.len(), 3);
        assert_eq!(store.list_subtree("a/").await.expect("list").len(), 5);
    }
}
