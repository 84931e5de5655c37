//! Scope tree for reactive page data.
//!
//! Every scope-bearing element owns one scope. Reads walk the chain from the
//! local scope outward; writes always land in the local scope.
//!
//! ## Module Structure
//!
//! - [`types`] - Type definitions (ScopeId, ScopeKind)
//! - [`tree`] - Scope and ScopeTree implementations, ScopeEnv

mod tree;
mod types;

pub use tree::{Scope, ScopeEnv, ScopeTree};
pub use types::{ChildScopes, ScopeId, ScopeKind};

#[cfg(test)]
mod tree_tests;
