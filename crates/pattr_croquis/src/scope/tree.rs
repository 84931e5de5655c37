//! Scope tree arena.
//!
//! - `Scope` - one reactive data context
//! - `ScopeTree` - owns every scope; parents and children refer to each
//!   other by [`ScopeId`]
//! - `ScopeEnv` - evaluates expressions against a scope with local-first
//!   reads and local writes

use std::fmt::Write as _;
use std::rc::Rc;

use pattr_carton::{CompactString, FxHashMap, FxHashSet};
use pattr_relief::NodeId;

use super::types::{ChildScopes, ScopeId, ScopeKind};
use crate::expression::Environment;
use crate::tracking::DefiningExpression;
use crate::value::Value;

/// A single scope in the tree
#[derive(Debug)]
pub struct Scope {
    /// Unique identifier
    pub id: ScopeId,
    /// Kind of scope
    pub kind: ScopeKind,
    /// Enclosing scope (None for root)
    pub parent: Option<ScopeId>,
    /// Child scopes in document order
    pub children: ChildScopes,
    /// Element that owns this scope
    pub element: Option<NodeId>,
    /// Key of the raw data record within the parent's record
    pub key: CompactString,
    /// Variables written into this scope
    data: FxHashMap<CompactString, Value>,
    /// Names whose initial value came from raw scope data
    seeded: FxHashSet<CompactString>,
    /// Statements deriving this scope's data from its parent
    defining: Option<Rc<DefiningExpression>>,
    /// Parent values the defining expression last observed
    parent_snapshot: FxHashMap<CompactString, Value>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            kind,
            parent,
            children: ChildScopes::new(),
            element: None,
            key: CompactString::default(),
            data: FxHashMap::default(),
            seeded: FxHashSet::default(),
            defining: None,
            parent_snapshot: FxHashMap::default(),
        }
    }

    /// Get a variable from this scope only
    #[inline]
    pub fn get_local(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    #[inline]
    pub fn has_local(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Whether `name` was seeded from raw scope data
    #[inline]
    pub fn is_seeded(&self, name: &str) -> bool {
        self.seeded.contains(name)
    }

    /// Local variables sorted by name
    pub fn locals(&self) -> Vec<(&str, &Value)> {
        sorted_entries(&self.data)
    }

    #[inline]
    pub fn defining(&self) -> Option<&Rc<DefiningExpression>> {
        self.defining.as_ref()
    }

    /// Snapshot entries sorted by name
    pub fn parent_snapshot(&self) -> Vec<(&str, &Value)> {
        sorted_entries(&self.parent_snapshot)
    }

    #[inline]
    pub(crate) fn snapshot_mut(&mut self) -> &mut FxHashMap<CompactString, Value> {
        &mut self.parent_snapshot
    }
}

fn sorted_entries(map: &FxHashMap<CompactString, Value>) -> Vec<(&str, &Value)> {
    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Owns every scope of a page
#[derive(Debug)]
pub struct ScopeTree {
    /// All scopes (indexed by ScopeId)
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a tree holding only the root scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeId::ROOT, ScopeKind::Root, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Add a child scope under `parent`
    pub fn add_child(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        key: impl Into<CompactString>,
        element: Option<NodeId>,
    ) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        let mut scope = Scope::new(id, kind, Some(parent));
        scope.key = key.into();
        scope.element = element;
        self.scopes.push(scope);
        self.scope_mut(parent).children.push(id);
        id
    }

    #[inline]
    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.as_u32() as usize)
    }

    /// Get a scope minted by this tree
    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.as_u32() as usize]
    }

    #[inline]
    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.as_u32() as usize]
    }

    #[inline]
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).and_then(|s| s.parent)
    }

    /// `id` followed by its ancestors up to the root
    pub fn chain(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |s| self.parent(*s))
    }

    /// Whether `scope` is `ancestor` or lies beneath it
    pub fn is_within(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        self.chain(scope).any(|s| s == ancestor)
    }

    /// Resolve a variable local-first through the chain
    pub fn lookup(&self, id: ScopeId, name: &str) -> Value {
        self.chain(id)
            .find_map(|s| self.scope(s).get_local(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve a variable starting at the parent of `id`
    pub fn lookup_from_parent(&self, id: ScopeId, name: &str) -> Value {
        match self.parent(id) {
            Some(parent) => self.lookup(parent, name),
            None => Value::Undefined,
        }
    }

    /// Write a variable into the scope's own data
    pub fn set_local(&mut self, id: ScopeId, name: impl Into<CompactString>, value: Value) {
        self.scope_mut(id).data.insert(name.into(), value);
    }

    /// Write an initial value taken from raw scope data. Defining
    /// statements read seeded names from the scope itself.
    pub fn seed_local(&mut self, id: ScopeId, name: impl Into<CompactString>, value: Value) {
        let name = name.into();
        let scope = self.scope_mut(id);
        scope.seeded.insert(name.clone());
        scope.data.insert(name, value);
    }

    pub fn set_defining(&mut self, id: ScopeId, defining: Rc<DefiningExpression>) {
        self.scope_mut(id).defining = Some(defining);
    }

    /// Find the scope bound to an element
    pub fn find_by_element(&self, element: NodeId) -> Option<ScopeId> {
        self.scopes
            .iter()
            .find(|s| s.element == Some(element))
            .map(|s| s.id)
    }

    /// Human readable dump of the tree
    pub fn to_display(&self) -> String {
        let mut out = String::new();
        self.write_scope(&mut out, ScopeId::ROOT, 0);
        out
    }

    fn write_scope(&self, out: &mut String, id: ScopeId, depth: usize) {
        let scope = self.scope(id);
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{}{} {}", indent, id, scope.kind.to_display());
        if !scope.key.is_empty() {
            let _ = write!(out, " key={}", scope.key);
        }
        if let Some(element) = scope.element {
            let _ = write!(out, " element={}", element);
        }
        out.push('\n');
        if let Some(defining) = &scope.defining {
            let _ = writeln!(out, "{}  defining: {}", indent, defining.source());
        }
        let _ = writeln!(out, "{}  data: {}", indent, format_entries(&scope.locals()));
        if scope.parent.is_some() {
            let _ = writeln!(
                out,
                "{}  snapshot: {}",
                indent,
                format_entries(&scope.parent_snapshot())
            );
        }
        for child in &scope.children {
            self.write_scope(out, *child, depth + 1);
        }
    }
}

fn format_entries(entries: &[(&str, &Value)]) -> String {
    let parts: Vec<_> = entries
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.to_json()))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/// Expression environment bound to one scope
pub struct ScopeEnv<'t> {
    tree: &'t mut ScopeTree,
    scope: ScopeId,
}

impl<'t> ScopeEnv<'t> {
    pub fn new(tree: &'t mut ScopeTree, scope: ScopeId) -> Self {
        Self { tree, scope }
    }
}

impl Environment for ScopeEnv<'_> {
    fn lookup(&self, name: &str) -> Value {
        self.tree.lookup(self.scope, name)
    }

    fn assign(&mut self, name: &str, value: Value) {
        self.tree.set_local(self.scope, name, value);
    }
}
