//! # pattr_relief
//!
//! Relief - the element tree pattr binds scopes to.
//!
//! The tree is an arena of nodes addressed by [`NodeId`]. Element identity
//! is the id, so every engine-side association (element to scope, element
//! to listeners) is a plain table keyed by `NodeId`.

pub mod dom;
pub mod errors;

pub use dom::{Attribute, Document, ElementData, Node, NodeData, NodeId, NodeType};
pub use errors::{ErrorCode, ParseError};
