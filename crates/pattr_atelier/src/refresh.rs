//! Subtree refresh.
//!
//! A refresh walks a region of bound elements in document order. Each
//! scope-bearing element first brings its scope up to date with the
//! parent, then every element re-applies its directives.
//!
//! Refreshes never nest over the same region. A refresh requested for a
//! region overlapping one in progress (a directive writing to its own
//! scope, an assignment inside a directive expression) is dropped and
//! counted in [`RefreshReport::suppressed`].

use pattr_croquis::{ScopeEnv, ScopeId, Value};
use pattr_relief::NodeId;
use serde::Serialize;

use crate::engine::Engine;
use crate::errors::EngineError;
use crate::registry::DirectiveContext;

/// What a hydration or refresh did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    /// Bound elements visited
    pub visited: usize,
    /// Directive functions applied
    pub directives: usize,
    /// Statements re-run per scope, in walk order
    pub rerun: Vec<(ScopeId, Vec<usize>)>,
    /// Refresh requests dropped because their region was already refreshing
    pub suppressed: usize,
}

impl RefreshReport {
    /// Statements of `scope` that re-ran; None when the scope was untouched
    pub fn rerun_for(&self, scope: ScopeId) -> Option<&[usize]> {
        self.rerun
            .iter()
            .find(|(id, _)| *id == scope)
            .map(|(_, statements)| statements.as_slice())
    }

    pub fn merge(&mut self, other: RefreshReport) {
        self.visited += other.visited;
        self.directives += other.directives;
        self.rerun.extend(other.rerun);
        self.suppressed += other.suppressed;
    }
}

impl Engine {
    /// Refresh the subtree rooted at a bound element
    pub fn refresh(&mut self, node: NodeId) -> Result<RefreshReport, EngineError> {
        if !self.hydrated {
            return Err(EngineError::NotHydrated);
        }
        if !self.is_bound(node) {
            return Err(EngineError::UnknownNode(node));
        }
        let mut report = RefreshReport::default();
        self.refresh_region(node, &mut report);
        Ok(report)
    }

    /// Refresh the whole page
    pub fn refresh_all(&mut self) -> Result<RefreshReport, EngineError> {
        self.refresh(self.root)
    }

    /// Write a variable into a scope and refresh the scope's region
    pub fn set(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
    ) -> Result<RefreshReport, EngineError> {
        if !self.hydrated {
            return Err(EngineError::NotHydrated);
        }
        if self.scopes.get(scope).is_none() {
            return Err(EngineError::UnknownScope(scope));
        }
        self.scopes.set_local(scope, name, value);
        let mut report = RefreshReport::default();
        self.request_refresh(scope, &mut report);
        Ok(report)
    }

    /// Element whose subtree a scope covers
    pub fn scope_region(&self, scope: ScopeId) -> NodeId {
        self.scopes
            .get(scope)
            .and_then(|s| s.element)
            .unwrap_or(self.root)
    }

    pub(crate) fn request_refresh(&mut self, scope: ScopeId, report: &mut RefreshReport) {
        let region = self.scope_region(scope);
        self.refresh_region(region, report);
    }

    fn refresh_region(&mut self, region: NodeId, report: &mut RefreshReport) {
        let overlapping = self.refreshing.iter().copied().find(|&active| {
            self.document.contains(active, region) || self.document.contains(region, active)
        });
        if let Some(active) = overlapping {
            tracing::warn!(
                region = %region,
                active = %active,
                "refresh requested inside a running refresh of the same region; suppressed"
            );
            report.suppressed += 1;
            return;
        }

        self.refreshing.push(region);
        self.refresh_node(region, report);
        self.refreshing.pop();
    }

    fn refresh_node(&mut self, node: NodeId, report: &mut RefreshReport) {
        // Pending, failed and injected subtrees are skipped whole
        let Some(scope) = self.scope_of(node) else {
            return;
        };
        report.visited += 1;

        if self.scopes.scope(scope).element == Some(node) {
            let refreshed = self.scopes.refresh_scope(scope);
            if !refreshed.rerun.is_empty() {
                tracing::debug!(
                    scope = %scope,
                    changed = ?refreshed.changed,
                    "re-ran {} statement(s)",
                    refreshed.rerun.len()
                );
                report.rerun.push((scope, refreshed.rerun));
            }
        }

        self.apply_directives(node, scope, report);

        let children: Vec<_> = self.document.element_children(node).collect();
        for child in children {
            self.refresh_node(child, report);
        }
    }

    /// Evaluate and apply every directive bound to `node`
    pub(crate) fn apply_directives(
        &mut self,
        node: NodeId,
        scope: ScopeId,
        report: &mut RefreshReport,
    ) {
        let Some(bindings) = self.bindings.get(&node).cloned() else {
            return;
        };
        for binding in bindings.iter() {
            let value = match binding
                .program
                .evaluate(&mut ScopeEnv::new(&mut self.scopes, scope))
            {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(node = %node, attribute = %binding.attribute, "{}", err);
                    continue;
                }
            };
            let Some(directive) = self.directives.get(&binding.name.id) else {
                continue;
            };

            let mut ctx = DirectiveContext::new(&mut self.document, node, scope);
            directive(&mut ctx, &value, &binding.name.modifiers);
            let writes = ctx.into_writes();
            report.directives += 1;

            let wrote = binding.writes || !writes.is_empty();
            for (name, value) in writes {
                self.scopes.set_local(scope, name, value);
            }
            if wrote {
                self.request_refresh(scope, report);
            }
        }
    }
}
