//! Remote scope data (`p-src`).
//!
//! A `p-src` subtree stays unbound until its data arrives. The data is
//! merged into the subtree's raw record, then the subtree is hydrated like
//! any other. A failed fetch leaves the subtree unbound for good; the rest
//! of the page is unaffected.

use pattr_croquis::ScopeKind;
use pattr_relief::NodeId;

use crate::bootstrap::{parse_object_or_empty, DataSource};
use crate::engine::Engine;
use crate::errors::{EngineError, FetchError};
use crate::raw::RawScope;
use crate::refresh::RefreshReport;

impl Engine {
    /// Subtrees waiting for remote data, with their urls
    pub fn pending(&self) -> Vec<(NodeId, &str)> {
        self.pending
            .iter()
            .map(|p| (p.node, p.url.as_str()))
            .collect()
    }

    /// `p-src` subtrees whose data could not be loaded
    pub fn failed(&self) -> Vec<NodeId> {
        let mut failed: Vec<_> = self.failed.iter().copied().collect();
        failed.sort();
        failed
    }

    /// Fetch and hydrate every pending subtree, including ones that become
    /// pending while hydrating. Returns the subtrees hydrated.
    pub fn load_pending(&mut self, source: &dyn DataSource) -> Vec<NodeId> {
        let mut hydrated = Vec::new();
        while let Some(next) = self.pending.first() {
            let node = next.node;
            let body = source.fetch(&next.url);
            match self.resolve_pending(node, body) {
                Ok(Some(_)) => hydrated.push(node),
                Ok(None) => {}
                Err(err) => {
                    tracing::error!("{}", err);
                    break;
                }
            }
        }
        hydrated
    }

    /// Complete a pending subtree with the outcome of its fetch. Returns
    /// the hydration report, or None when the fetch failed.
    pub fn resolve_pending(
        &mut self,
        node: NodeId,
        body: Result<String, FetchError>,
    ) -> Result<Option<RefreshReport>, EngineError> {
        let index = self
            .pending
            .iter()
            .position(|p| p.node == node)
            .ok_or(EngineError::NotPending(node))?;
        let pending = self.pending.remove(index);

        let text = match body {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(node = %node, url = %pending.url, "remote data unavailable, subtree stays unbound: {}", err);
                self.failed.insert(node);
                return Ok(None);
            }
        };
        let fetched = parse_object_or_empty(&text, &pending.url);
        if let Some(record) = self.raw.descend_mut(&pending.path) {
            record.merge(RawScope::from_object(fetched));
        }

        let mut report = RefreshReport::default();
        let key = pending.path.last().cloned().unwrap_or_default();
        self.refreshing.push(node);
        let scope = self.create_scope(
            node,
            pending.parent_scope,
            ScopeKind::Remote,
            key,
            &pending.path,
            &mut report,
        );
        let mut path = pending.path;
        self.bind_subtree(node, scope, &mut path, &mut report);
        self.refreshing.pop();

        tracing::info!(node = %node, scope = %scope, "remote subtree hydrated");
        Ok(Some(report))
    }
}
