//! Permission kinds granted on drops.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A single permission kind stored on a grant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "permission_kind", rename_all = "lowercase")
)]
pub enum PermissionKind {
    /// See and download.
    Read,
    /// Create children inside a directory.
    Write,
    /// Rename, delete and manage sharing.
    Modify,
}

impl PermissionKind {
    /// Every stored permission kind.
    pub const ALL: [PermissionKind; 3] = [Self::Read, Self::Write, Self::Modify];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Modify => "modify",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "modify" => Ok(Self::Modify),
            other => Err(AppError::validation(format!(
                "Unknown permission kind: '{other}'"
            ))),
        }
    }
}

/// A permission kind as requested by a caller. `All` is a request-level
/// shorthand and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantKind {
    Read,
    Write,
    Modify,
    All,
}

impl GrantKind {
    /// The stored kinds this request stands for.
    pub fn expand(&self) -> &'static [PermissionKind] {
        match self {
            Self::Read => &[PermissionKind::Read],
            Self::Write => &[PermissionKind::Write],
            Self::Modify => &[PermissionKind::Modify],
            Self::All => &PermissionKind::ALL,
        }
    }

    /// Kind used when filtering grant rows; `None` matches every kind.
    pub fn as_filter(&self) -> Option<PermissionKind> {
        match self {
            Self::Read => Some(PermissionKind::Read),
            Self::Write => Some(PermissionKind::Write),
            Self::Modify => Some(PermissionKind::Modify),
            Self::All => None,
        }
    }
}

impl From<PermissionKind> for GrantKind {
    fn from(kind: PermissionKind) -> Self {
        match kind {
            PermissionKind::Read => Self::Read,
            PermissionKind::Write => Self::Write,
            PermissionKind::Modify => Self::Modify,
        }
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_filter() {
            Some(kind) => f.write_str(kind.as_str()),
            None => f.write_str("all"),
        }
    }
}

impl FromStr for GrantKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse::<PermissionKind>().map(Self::from)
    }
}
