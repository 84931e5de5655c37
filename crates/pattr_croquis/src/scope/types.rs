//! Type definitions for the scope tree.

use pattr_carton::SmallVec;
use serde::Serialize;

/// Child scope references (most scopes have few children)
pub type ChildScopes = SmallVec<[ScopeId; 4]>;

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope (page level)
    pub const ROOT: Self = Self(0);

    /// Create a new scope ID
    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ScopeKind {
    /// Page-level scope holding the embedded root data
    Root = 0,
    /// Scope declared with `p-data` / `p-scope`
    Defined = 1,
    /// Scope whose data was fetched from `p-src`
    Remote = 2,
}

impl ScopeKind {
    pub const fn to_display(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Defined => "defined",
            Self::Remote => "remote",
        }
    }
}
