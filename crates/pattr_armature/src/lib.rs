//! # pattr_armature
//!
//! Armature - the structural parser for pattr pages.
//!
//! - [`tokenizer`] - byte-level HTML state machine
//! - [`parser`] - builds a [`pattr_relief::Document`] from the token stream
//! - [`serialize`] - writes a document (or a subtree) back out as HTML

pub mod parser;
pub mod serialize;
pub mod tokenizer;

pub use parser::{parse, parse_fragment_into};
pub use serialize::{inner_html, outer_html, to_html};
