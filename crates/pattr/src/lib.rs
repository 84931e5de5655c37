//! # pattr
//!
//! Attribute-driven reactive pages in Rust.
//!
//! This crate re-exports all pattr sub-crates for unified documentation.
//!
//! ## Crates
//!
//! - [`carton`] - Shared utilities and collection re-exports
//! - [`relief`] - The element tree
//! - [`armature`] - HTML parser and serializer
//! - [`croquis`] - Values, expressions, scopes and change tracking
//! - [`atelier`] - The reactivity engine

/// Shared utilities and collection re-exports.
pub use pattr_carton as carton;

/// The element tree.
pub use pattr_relief as relief;

/// HTML parser and serializer.
pub use pattr_armature as armature;

/// Values, expressions, scopes and change tracking.
pub use pattr_croquis as croquis;

/// The reactivity engine.
pub use pattr_atelier as atelier;
