//! In-memory store implementations.
//!
//! Each store keeps a `BTreeMap` keyed by path behind a tokio `RwLock`, so a
//! directory subtree is a contiguous key range. Every multi-row operation
//! runs under one write guard and is therefore atomic.

pub mod drop;
pub mod permission;
pub mod watch;

pub use drop::MemoryEntryStore;
pub use permission::MemoryPermissionStore;
pub use watch::MemoryWatchStore;

use std::collections::BTreeMap;

use puddle_core::types::path;

/// Keys of `map` inside the scope of `target`: the key itself, plus every
/// key below it when `target` is a directory.
pub(crate) fn scoped_keys<V>(map: &BTreeMap<String, V>, target: &str) -> Vec<String> {
    if path::is_directory(target) {
        map.range(target.to_string()..)
            .take_while(|(key, _)| key.starts_with(target))
            .map(|(key, _)| key.clone())
            .collect()
    } else if map.contains_key(target) {
        vec![target.to_string()]
    } else {
        Vec::new()
    }
}

/// Move every key in the scope of `old_path` to its rebased path. Entries
/// already at a destination key are overwritten. Returns the new keys.
pub(crate) fn rebase_keys<V>(
    map: &mut BTreeMap<String, V>,
    old_path: &str,
    new_path: &str,
) -> Vec<String> {
    let keys = scoped_keys(map, old_path);
    let mut moved = Vec::with_capacity(keys.len());
    for key in keys {
        if let (Some(value), Some(rebased)) =
            (map.remove(&key), path::rebase(&key, old_path, new_path))
        {
            moved.push((rebased, value));
        }
    }
    let keys = moved.iter().map(|(key, _)| key.clone()).collect();
    map.extend(moved);
    keys
}
