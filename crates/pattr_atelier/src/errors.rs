//! Engine error types.

use pattr_croquis::ScopeId;
use pattr_relief::NodeId;
use thiserror::Error;

/// Errors surfaced by [`Engine`](crate::Engine) operations.
///
/// Data and expression failures inside a page never surface here; they are
/// logged and the engine degrades instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("root element not found: {0}")]
    RootNotFound(String),

    #[error("the page has already been hydrated")]
    AlreadyHydrated,

    #[error("the page has not been hydrated yet")]
    NotHydrated,

    #[error("unknown scope {0}")]
    UnknownScope(ScopeId),

    #[error("node {0} is not an element of this page")]
    UnknownNode(NodeId),

    #[error("node {0} has no pending remote data")]
    NotPending(NodeId),

    #[error("invalid JSON in {origin}: {message}")]
    InvalidJson { origin: String, message: String },

    #[error("JSON in {origin} is not an object")]
    NotAnObject { origin: String },
}

/// Failure of a [`DataSource`](crate::DataSource) fetch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to read {url}: {message}")]
    Io { url: String, message: String },

    #[error("refused to load {0}")]
    Refused(String),
}
