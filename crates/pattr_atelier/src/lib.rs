//! Atelier - The reactivity engine of pattr.
//!
//! ## Name Origin
//!
//! **Atelier** (/a.tə.lje/) is the workshop where a piece is finished.
//! This crate takes a parsed page and its data and works them together:
//! it hydrates scopes, binds directives and listeners, and keeps the
//! elements in step with the data as it changes.
//!
//! ## Overview
//!
//! ```text
//! Document + root JSON
//!        │
//!        ▼
//!   raw records ──► scope tree ──► directives / listeners
//!                        ▲                 │
//!                        └── set / event ◄─┘
//! ```
//!
//! - [`Engine::hydrate`] binds the page once
//! - [`Engine::set`] and [`Engine::dispatch`] change data and refresh the
//!   affected region
//! - [`Engine::load_pending`] completes `p-src` subtrees
//!
//! Custom directives are plain functions registered in a
//! [`DirectiveRegistry`].

pub mod bootstrap;
pub mod builtins;
pub mod directive;
mod engine;
pub mod errors;
mod events;
pub mod raw;
mod refresh;
pub mod registry;
mod remote;

pub use bootstrap::{parse_object, DataSource, EngineOptions};
pub use directive::{DirectiveName, EventModifiers, Modifier, Modifiers};
pub use engine::Engine;
pub use errors::{EngineError, FetchError};
pub use events::{DispatchReport, Event};
pub use raw::RawScope;
pub use refresh::RefreshReport;
pub use registry::{DirectiveContext, DirectiveFn, DirectiveRegistry};
