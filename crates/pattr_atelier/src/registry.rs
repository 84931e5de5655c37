//! Directive registry.

use pattr_carton::{CompactString, FxHashMap};
use pattr_croquis::{ScopeId, Value};
use pattr_relief::{Document, NodeId};

use crate::builtins;
use crate::directive::Modifiers;

/// A directive function: mutates the element in `ctx` to present `value`
pub type DirectiveFn = Box<dyn Fn(&mut DirectiveContext<'_>, &Value, &Modifiers)>;

/// What a directive function may touch while it runs
pub struct DirectiveContext<'a> {
    /// The page
    pub doc: &'a mut Document,
    /// Element carrying the directive
    pub element: NodeId,
    scope: ScopeId,
    writes: Vec<(CompactString, Value)>,
}

impl<'a> DirectiveContext<'a> {
    pub(crate) fn new(doc: &'a mut Document, element: NodeId, scope: ScopeId) -> Self {
        Self {
            doc,
            element,
            scope,
            writes: Vec::new(),
        }
    }

    /// Scope the element resolves variables against
    #[inline]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Write a variable into the element's scope once the directive returns.
    /// The write lands, but a refresh it would trigger inside a running
    /// refresh is suppressed.
    pub fn set(&mut self, name: impl Into<CompactString>, value: Value) {
        self.writes.push((name.into(), value));
    }

    pub(crate) fn into_writes(self) -> Vec<(CompactString, Value)> {
        self.writes
    }
}

/// Directive table keyed by directive id
pub struct DirectiveRegistry {
    directives: FxHashMap<CompactString, DirectiveFn>,
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.directives.keys().collect();
        ids.sort();
        f.debug_struct("DirectiveRegistry").field("ids", &ids).finish()
    }
}

impl DirectiveRegistry {
    /// Registry without any directive
    pub fn empty() -> Self {
        Self {
            directives: FxHashMap::default(),
        }
    }

    /// Registry with `p-text`, `p-html`, `p-show` and `p-model`
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("p-text", builtins::text);
        registry.register("p-html", builtins::html);
        registry.register("p-show", builtins::show);
        registry.register("p-model", builtins::model);
        registry
    }

    /// Register (or replace) a directive
    pub fn register<F>(&mut self, id: impl Into<CompactString>, directive: F)
    where
        F: Fn(&mut DirectiveContext<'_>, &Value, &Modifiers) + 'static,
    {
        self.directives.insert(id.into(), Box::new(directive));
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&DirectiveFn> {
        self.directives.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.directives.contains_key(id)
    }
}
