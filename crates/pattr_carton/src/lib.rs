//! Carton - The shared toolbox for pattr.
//!
//! This crate holds the small utilities and type re-exports every other
//! pattr crate leans on, so the workspace agrees on one string type, one
//! hash map and one inline vector.
//!
//! # Modules
//!
//! - **dom_tag_config**: HTML tag tables (void elements, raw text elements)
//! - **general**: identifier and text helpers shared by the parsers

pub mod dom_tag_config;
pub mod general;

// Re-export compact_str::CompactString for convenience
pub use compact_str::format_compact;
pub use compact_str::CompactString;
pub use compact_str::ToCompactString;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_set, Set as PhfSet};

// Re-export shared utilities
pub use dom_tag_config::*;
pub use general::*;
