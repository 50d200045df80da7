//! Pure string operations over drop paths.
//!
//! A path is relative and `/`-separated. Directories end with `/`, files do
//! not. The first segment names the user owning the puddle. None of these
//! functions touch storage.

use crate::error::AppError;

/// The path separator.
pub const SEPARATOR: char = '/';

/// Returns true when the path names a directory.
pub fn is_directory(path: &str) -> bool {
    path.ends_with(SEPARATOR)
}

/// Returns the directory that contains `path`.
///
/// `"a/b/"` yields `"a/"`, `"a/b/f"` yields `"a/b/"` and `"a/"` yields `""`.
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.strip_suffix(SEPARATOR).unwrap_or(path);
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// Returns the last segment of `path`, keeping the trailing separator for
/// directories.
pub fn leaf_name(path: &str) -> &str {
    &path[parent_dir(path).len()..]
}

/// Returns the first segment of `path`, the user owning the puddle.
pub fn owner(path: &str) -> &str {
    match path.find(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Returns the puddle root (`<owner>/`) containing `path`.
pub fn puddle_root(path: &str) -> String {
    format!("{}{SEPARATOR}", owner(path))
}

/// A puddle root is the only kind of path whose parent has no separator.
pub fn is_protected_root(path: &str) -> bool {
    !parent_dir(path).contains(SEPARATOR)
}

/// Returns true when `path` is `scope` itself or, if `scope` is a
/// directory, lies underneath it.
pub fn is_within(path: &str, scope: &str) -> bool {
    path == scope || (is_directory(scope) && path.starts_with(scope))
}

/// Returns true when `path` lies strictly underneath directory `dir`.
pub fn is_strict_descendant(path: &str, dir: &str) -> bool {
    is_directory(dir) && path.len() > dir.len() && path.starts_with(dir)
}

/// Returns true when both paths are directories or both are files.
pub fn same_kind(a: &str, b: &str) -> bool {
    is_directory(a) == is_directory(b)
}

/// The same name with the opposite kind: `a/x` for `a/x/` and back.
///
/// Blob storage maps both onto one location, so at most one of them may exist.
pub fn twin(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(file) => file.to_string(),
        None => format!("{path}/"),
    }
}

/// Replaces the leading `old_prefix` of `path` with `new_prefix`.
///
/// Only the leading occurrence is rewritten; an `old_prefix` that shows up
/// later in the path is left alone. Returns `None` when `path` does not start
/// with `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    path.strip_prefix(old_prefix)
        .map(|rest| format!("{new_prefix}{rest}"))
}

/// Appends `name` to directory `dir`.
pub fn join(dir: &str, name: &str) -> Result<String, AppError> {
    if !is_directory(dir) {
        return Err(AppError::invalid_path(format!(
            "Cannot join onto non-directory path '{dir}'"
        )));
    }
    Ok(format!("{dir}{name}"))
}

/// Checks that `path` is well formed: non-empty, relative, no empty, `.` or
/// `..` segments and no control characters.
pub fn validate(path: &str) -> Result<(), AppError> {
    if path.is_empty() {
        return Err(AppError::invalid_path("Path is empty"));
    }
    if path.starts_with(SEPARATOR) {
        return Err(AppError::invalid_path(format!(
            "Path '{path}' must be relative"
        )));
    }
    let body = path.strip_suffix(SEPARATOR).unwrap_or(path);
    for segment in body.split(SEPARATOR) {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(AppError::invalid_path(format!(
                "Path '{path}' contains an invalid segment"
            )));
        }
        if segment.chars().any(char::is_control) {
            return Err(AppError::invalid_path(format!(
                "Path '{path}' contains control characters"
            )));
        }
    }
    Ok(())
}

/// Turns an arbitrary user-supplied name into a single safe segment.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c == SEPARATOR || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
