//! Croquis - The reactive data layer for pattr.
//!
//! ## Name Origin
//!
//! **Croquis** (/kʁɔ.ki/) is a quick sketch capturing the essential lines of
//! a subject. This crate sketches the data behind a page: the scope tree,
//! the expression language evaluated against it, and the change tracker
//! that keeps derived scopes in step with their parents.
//!
//! ## Features
//!
//! - **Values**: JSON-shaped runtime values with JavaScript coercions
//! - **Expressions**: lexer, parser and evaluator for attribute expressions
//! - **Scopes**: arena-backed scope tree with layered lookup
//! - **Tracking**: AST-level dependency extraction and selective re-execution

pub mod errors;
pub mod expression;
pub mod scope;
pub mod tracking;
pub mod value;

pub use errors::EvalError;
pub use expression::{evaluate, execute, parse_expression, parse_program, Environment, Program};
pub use scope::{Scope, ScopeEnv, ScopeId, ScopeKind, ScopeTree};
pub use tracking::{DefiningExpression, DerivationEnv, ScopeRefresh};
pub use value::{Object, Value};
