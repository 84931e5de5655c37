//! The engine instance.
//!
//! An [`Engine`] owns a page and everything bound to it: the scope tree,
//! the element to scope table, compiled directive bindings and the
//! listener table. Nothing is global; two engines never share state.
//!
//! Hydration runs in two passes. The first gathers raw scope records from
//! the root JSON and the page's scope-bearing elements. The second creates
//! the live scopes, compiles bindings, attaches listeners and applies every
//! directive once.

use std::rc::Rc;

use pattr_armature::to_html;
use pattr_carton::{CompactString, FxHashMap, FxHashSet};
use pattr_croquis::expression::AssignTarget;
use pattr_croquis::{
    parse_expression, parse_program, DefiningExpression, Program, ScopeId, ScopeKind, ScopeTree,
    Value,
};
use pattr_relief::{Document, NodeId};

use crate::bootstrap::{find_root, read_root_data, EngineOptions};
use crate::directive::{is_engine_attribute, parse_event_attribute, DirectiveName};
use crate::errors::EngineError;
use crate::events::{Listener, ListenerAction};
use crate::raw::{KeyAllocator, RawScope};
use crate::refresh::RefreshReport;
use crate::registry::DirectiveRegistry;

/// A directive attribute compiled at hydration
#[derive(Debug)]
pub(crate) struct DirectiveBinding {
    pub(crate) attribute: CompactString,
    pub(crate) name: DirectiveName,
    pub(crate) program: Program,
    /// The expression assigns a variable when evaluated
    pub(crate) writes: bool,
}

/// A `p-src` subtree waiting for its data
#[derive(Debug, Clone)]
pub(crate) struct PendingScope {
    pub(crate) node: NodeId,
    pub(crate) parent_scope: ScopeId,
    /// Key path of the subtree's raw record
    pub(crate) path: Vec<CompactString>,
    pub(crate) url: String,
}

/// The reactivity engine bound to one page
pub struct Engine {
    pub(crate) document: Document,
    pub(crate) options: EngineOptions,
    pub(crate) directives: DirectiveRegistry,
    pub(crate) scopes: ScopeTree,
    pub(crate) raw: RawScope,
    /// Element hydration starts from
    pub(crate) root: NodeId,
    pub(crate) hydrated: bool,
    /// Every hydrated element and the scope it resolves against
    pub(crate) bound: FxHashMap<NodeId, ScopeId>,
    /// Raw record key of every scope-bearing element
    pub(crate) raw_keys: FxHashMap<NodeId, CompactString>,
    pub(crate) bindings: FxHashMap<NodeId, Rc<[DirectiveBinding]>>,
    pub(crate) listeners: FxHashMap<NodeId, Vec<Listener>>,
    pub(crate) pending: Vec<PendingScope>,
    /// `p-src` subtrees whose fetch failed
    pub(crate) failed: FxHashSet<NodeId>,
    /// Regions with a refresh in progress
    pub(crate) refreshing: Vec<NodeId>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("hydrated", &self.hydrated)
            .field("scopes", &self.scopes.len())
            .field("bound", &self.bound.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Engine {
    /// Prepare an engine for `document`. Reads the embedded root data; does
    /// not hydrate.
    pub fn new(document: Document, options: EngineOptions) -> Result<Self, EngineError> {
        let root = find_root(&document, &options)?;
        let raw = RawScope::from_object(read_root_data(&document, &options));
        Ok(Self {
            document,
            options,
            directives: DirectiveRegistry::with_builtins(),
            scopes: ScopeTree::new(),
            raw,
            root,
            hydrated: false,
            bound: FxHashMap::default(),
            raw_keys: FxHashMap::default(),
            bindings: FxHashMap::default(),
            listeners: FxHashMap::default(),
            pending: Vec::new(),
            failed: FxHashSet::default(),
            refreshing: Vec::new(),
        })
    }

    /// Replace the directive table
    pub fn with_directives(mut self, directives: DirectiveRegistry) -> Self {
        self.directives = directives;
        self
    }

    pub fn directives_mut(&mut self) -> &mut DirectiveRegistry {
        &mut self.directives
    }

    // ==== Accessors ====

    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    #[inline]
    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    /// Raw scope records gathered during hydration
    #[inline]
    pub fn raw_data(&self) -> &RawScope {
        &self.raw
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Scope an element resolves against; None for unbound elements
    #[inline]
    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.bound.get(&node).copied()
    }

    #[inline]
    pub fn is_bound(&self, node: NodeId) -> bool {
        self.bound.contains_key(&node)
    }

    /// Resolve a variable through the scope chain
    pub fn get(&self, scope: ScopeId, name: &str) -> Value {
        self.scopes.lookup(scope, name)
    }

    /// Serialize the current page
    pub fn to_html(&self) -> String {
        to_html(&self.document)
    }

    // ==== Hydration ====

    /// Bind the page. Runs once; a second call is an error.
    pub fn hydrate(&mut self) -> Result<RefreshReport, EngineError> {
        if self.hydrated {
            return Err(EngineError::AlreadyHydrated);
        }
        self.hydrated = true;

        let mut keys = KeyAllocator::default();
        collect_raw(
            &self.document,
            self.root,
            &mut self.raw,
            &mut keys,
            &mut self.raw_keys,
        );
        for (name, value) in self.raw.data.clone() {
            self.scopes.set_local(ScopeId::ROOT, name, value);
        }

        let mut report = RefreshReport::default();
        let root = self.root;
        self.refreshing.push(root);
        self.hydrate_element(root, ScopeId::ROOT, &mut Vec::new(), &mut report);
        self.refreshing.pop();

        tracing::info!(
            "hydrated {} elements into {} scopes ({} pending)",
            self.bound.len(),
            self.scopes.len(),
            self.pending.len()
        );
        Ok(report)
    }

    pub(crate) fn hydrate_element(
        &mut self,
        node: NodeId,
        parent_scope: ScopeId,
        path: &mut Vec<CompactString>,
        report: &mut RefreshReport,
    ) {
        if !self.document.is_element(node) {
            return;
        }
        let Some(key) = self.raw_keys.get(&node).cloned() else {
            self.bind_subtree(node, parent_scope, path, report);
            return;
        };

        path.push(key.clone());
        if let Some(url) = self.document.attribute(node, "p-src") {
            tracing::debug!(node = %node, url, "subtree waits for remote data");
            self.pending.push(PendingScope {
                node,
                parent_scope,
                path: path.clone(),
                url: url.to_string(),
            });
        } else {
            let scope =
                self.create_scope(node, parent_scope, ScopeKind::Defined, key, path, report);
            self.bind_subtree(node, scope, path, report);
        }
        path.pop();
    }

    /// Create the scope of a scope-bearing element from its raw record
    pub(crate) fn create_scope(
        &mut self,
        node: NodeId,
        parent: ScopeId,
        kind: ScopeKind,
        key: CompactString,
        path: &[CompactString],
        report: &mut RefreshReport,
    ) -> ScopeId {
        let scope = self.scopes.add_child(parent, kind, key, Some(node));
        let (seed, defining) = match self.raw.descend(path) {
            Some(record) => (record.data.clone(), record.defining.clone()),
            None => (Default::default(), None),
        };
        for (name, value) in seed {
            self.scopes.seed_local(scope, name, value);
        }
        if let Some(source) = defining {
            match DefiningExpression::parse(&source) {
                Ok(defining) => {
                    self.scopes.set_defining(scope, Rc::new(defining));
                    let ran = self.scopes.initialize_scope(scope);
                    if !ran.is_empty() {
                        report.rerun.push((scope, ran));
                    }
                }
                Err(err) => {
                    tracing::error!(node = %node, source = %source, "invalid scope definition: {}", err)
                }
            }
        }
        tracing::debug!(scope = %scope, node = %node, kind = kind.to_display(), "scope created");
        scope
    }

    /// Bind `node` to `scope`, apply its directives and hydrate its children
    pub(crate) fn bind_subtree(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        path: &mut Vec<CompactString>,
        report: &mut RefreshReport,
    ) {
        self.bound.insert(node, scope);
        self.compile_element(node);
        report.visited += 1;

        // Content a directive injects is never hydrated
        let children: Vec<_> = self.document.element_children(node).collect();
        self.apply_directives(node, scope, report);
        for child in children {
            if self.document.parent(child) == Some(node) {
                self.hydrate_element(child, scope, path, report);
            }
        }
    }

    /// Compile directive bindings and listeners of one element
    fn compile_element(&mut self, node: NodeId) {
        let mut bindings = Vec::new();
        let mut listeners = Vec::new();

        for attr in self.document.attributes(node).to_vec() {
            let name = attr.name.as_str();
            if let Some((event, modifiers)) = parse_event_attribute(name) {
                match parse_program(&attr.value) {
                    Ok(program) => listeners.push(Listener::new(
                        event,
                        modifiers,
                        ListenerAction::Run(program),
                    )),
                    Err(err) => tracing::warn!(node = %node, attribute = name, "invalid handler: {}", err),
                }
                continue;
            }
            if is_engine_attribute(name) {
                continue;
            }

            let directive = DirectiveName::parse(name);
            if directive.id == "p-model" {
                match parse_expression(&attr.value).map(AssignTarget::from_expr) {
                    Ok(Some(target)) => listeners.push(Listener::new(
                        "input".into(),
                        Default::default(),
                        ListenerAction::Model {
                            target,
                            number: directive.modifiers.has("number"),
                            trim: directive.modifiers.has("trim"),
                        },
                    )),
                    Ok(None) => tracing::warn!(node = %node, "p-model needs a variable, got '{}'", attr.value),
                    Err(err) => tracing::warn!(node = %node, "invalid p-model: {}", err),
                }
            }
            if !self.directives.contains(&directive.id) {
                continue;
            }
            match parse_program(&attr.value) {
                Ok(program) => bindings.push(DirectiveBinding {
                    attribute: attr.name.clone(),
                    writes: program.has_assignment(),
                    name: directive,
                    program,
                }),
                Err(err) => tracing::warn!(node = %node, attribute = name, "invalid directive expression: {}", err),
            }
        }

        if !bindings.is_empty() {
            self.bindings.insert(node, bindings.into());
        }
        if !listeners.is_empty() {
            self.listeners.insert(node, listeners);
        }
    }
}

/// First hydration pass: give every scope-bearing element a raw record and
/// a key within its nearest scope-bearing ancestor's record
fn collect_raw(
    doc: &Document,
    node: NodeId,
    record: &mut RawScope,
    keys: &mut KeyAllocator,
    out: &mut FxHashMap<NodeId, CompactString>,
) {
    if is_scope_bearing(doc, node) {
        let key = keys.next_key(doc.attribute(node, "p-id"));
        let child = record.children.entry(key.clone()).or_default();
        if let Some(defining) = doc
            .attribute(node, "p-data")
            .or_else(|| doc.attribute(node, "p-scope"))
        {
            child.defining = Some(defining.to_string());
        }
        if let Some(src) = doc.attribute(node, "p-src") {
            child.src = Some(src.to_string());
        }
        out.insert(node, key);

        let mut child_keys = KeyAllocator::default();
        for c in doc.element_children(node) {
            collect_raw(doc, c, child, &mut child_keys, out);
        }
        return;
    }
    for c in doc.element_children(node) {
        collect_raw(doc, c, record, keys, out);
    }
}

fn is_scope_bearing(doc: &Document, node: NodeId) -> bool {
    ["p-data", "p-scope", "p-src"]
        .iter()
        .any(|attr| doc.has_attribute(node, attr))
}
