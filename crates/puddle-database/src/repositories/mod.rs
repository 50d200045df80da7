//! PostgreSQL implementations of the namespace stores.

pub mod drop;
pub mod permission;
pub mod watch;

pub use drop::DropRepository;
pub use permission::PermissionRepository;
pub use watch::WatchRepository;

use puddle_core::types::path;

/// A `WHERE` fragment selecting a path scope, always bound as `$1`.
///
/// Directories match themselves and everything below them through a `LIKE`
/// prefix pattern; files match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scope {
    pub clause: &'static str,
    pub value: String,
}

impl Scope {
    pub(crate) fn of(target: &str) -> Self {
        if path::is_directory(target) {
            Self {
                clause: "path LIKE $1",
                value: prefix_pattern(target),
            }
        } else {
            Self {
                clause: "path = $1",
                value: target.to_string(),
            }
        }
    }
}

/// Escape `LIKE` metacharacters in `prefix` and append the wildcard.
pub(crate) fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
