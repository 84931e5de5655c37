//! Change tracking for scope-defining expressions.
//!
//! A defining expression derives a scope's variables from its parent. The
//! tracker remembers which parent values the expression consumed, and on
//! refresh re-runs only the statements whose inputs changed.
//!
//! Dependencies come from the AST. A statement depends on a name when it
//! reads it (identifier, member root, computed key or compound target).
//! Selection propagates forward: when a statement re-runs, the names it
//! assigns count as changed for the statements after it.

use pattr_carton::{CompactString, FxHashSet};

use crate::errors::EvalError;
use crate::expression::{eval_expr, parse_program, Environment, Program, Stmt};
use crate::scope::{ScopeId, ScopeTree};
use crate::value::Value;

/// Parsed defining expression with per-statement dependency sets
#[derive(Debug)]
pub struct DefiningExpression {
    source: String,
    program: Program,
    reads: Vec<FxHashSet<CompactString>>,
    targets: Vec<FxHashSet<CompactString>>,
    /// Names assigned by the statements before statement `i`
    assigned_before: Vec<FxHashSet<CompactString>>,
    /// Names statement `i` reads from the parent chain even when seeded:
    /// assigned at or after `i` but not before it
    parent_first: Vec<FxHashSet<CompactString>>,
    /// Parent values the expression consumes, sorted
    dependencies: Vec<CompactString>,
}

impl DefiningExpression {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let program = parse_program(source)?;
        let reads: Vec<_> = program.statements.iter().map(Stmt::reads).collect();
        let targets: Vec<_> = program.statements.iter().map(Stmt::targets).collect();

        let mut assigned_before: FxHashSet<CompactString> = FxHashSet::default();
        let mut dependencies = FxHashSet::default();
        let mut parent_first = Vec::with_capacity(targets.len());
        let mut assigned = Vec::with_capacity(targets.len());
        for (i, statement_reads) in reads.iter().enumerate() {
            assigned.push(assigned_before.clone());
            dependencies.extend(
                statement_reads
                    .iter()
                    .filter(|name| !assigned_before.contains(*name))
                    .cloned(),
            );
            let later: FxHashSet<CompactString> = targets[i..]
                .iter()
                .flatten()
                .filter(|name| !assigned_before.contains(*name))
                .cloned()
                .collect();
            parent_first.push(later);
            assigned_before.extend(targets[i].iter().cloned());
        }
        let mut dependencies: Vec<_> = dependencies.into_iter().collect();
        dependencies.sort();

        Ok(Self {
            source: source.to_string(),
            program,
            reads,
            targets,
            assigned_before: assigned,
            parent_first,
            dependencies,
        })
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn statements(&self) -> &[Stmt] {
        &self.program.statements
    }

    /// Source text of statement `index`
    pub fn statement_source(&self, index: usize) -> &str {
        self.program
            .statements
            .get(index)
            .and_then(|s| self.source.get(s.start as usize..s.end as usize))
            .unwrap_or_default()
    }

    /// Parent variables this expression consumes
    #[inline]
    pub fn dependencies(&self) -> &[CompactString] {
        &self.dependencies
    }

    /// Indices of the statements that must re-run for `changed`
    pub fn select_statements(&self, changed: &FxHashSet<CompactString>) -> Vec<usize> {
        let mut dirty = changed.clone();
        let mut selected = Vec::new();
        for (i, reads) in self.reads.iter().enumerate() {
            if reads.iter().any(|name| dirty.contains(name)) {
                selected.push(i);
                dirty.extend(self.targets[i].iter().cloned());
            }
        }
        selected
    }
}

/// Environment for defining statements.
///
/// Names produced by earlier statements are read from the scope itself.
/// Every other read goes to the parent chain, the same values change
/// detection snapshots, so a handler writing a same-named local never
/// shadows the parent. Seeded names are the exception unless the statement
/// list assigns them itself: `count = count * 2` keeps deriving from the
/// parent on every re-run.
pub struct DerivationEnv<'t> {
    tree: &'t mut ScopeTree,
    scope: ScopeId,
    assigned_before: &'t FxHashSet<CompactString>,
    parent_first: &'t FxHashSet<CompactString>,
}

impl Environment for DerivationEnv<'_> {
    fn lookup(&self, name: &str) -> Value {
        let local = self.assigned_before.contains(name)
            || (!self.parent_first.contains(name) && self.tree.scope(self.scope).is_seeded(name));
        if local {
            self.tree.lookup(self.scope, name)
        } else {
            self.tree.lookup_from_parent(self.scope, name)
        }
    }

    fn assign(&mut self, name: &str, value: Value) {
        self.tree.set_local(self.scope, name, value);
    }
}

/// Outcome of refreshing one scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeRefresh {
    /// Parent variables that changed, sorted
    pub changed: Vec<CompactString>,
    /// Statements that re-ran
    pub rerun: Vec<usize>,
}

// ==== Change tracker ====

impl ScopeTree {
    /// Run the whole defining expression and record the initial snapshot
    pub fn initialize_scope(&mut self, id: ScopeId) -> Vec<usize> {
        let Some(defining) = self.scope(id).defining().cloned() else {
            return Vec::new();
        };
        let all: Vec<usize> = (0..defining.statements().len()).collect();
        self.run_statements(id, &defining, &all);
        self.take_snapshot(id);
        all
    }

    /// Store the parent values of every dependency
    pub fn take_snapshot(&mut self, id: ScopeId) {
        let Some(defining) = self.scope(id).defining().cloned() else {
            return;
        };
        let values: Vec<_> = defining
            .dependencies()
            .iter()
            .map(|name| (name.clone(), self.lookup_from_parent(id, name)))
            .collect();
        let snapshot = self.scope_mut(id).snapshot_mut();
        snapshot.clear();
        snapshot.extend(values);
    }

    /// Compare current parent values against the snapshot, then update it.
    /// Returns the dependencies whose value changed.
    pub fn detect_changes(&mut self, id: ScopeId) -> FxHashSet<CompactString> {
        let Some(defining) = self.scope(id).defining().cloned() else {
            return FxHashSet::default();
        };
        let mut changed = FxHashSet::default();
        for name in defining.dependencies() {
            let current = self.lookup_from_parent(id, name);
            let snapshot = self.scope_mut(id).snapshot_mut();
            let same = snapshot
                .get(name)
                .is_some_and(|previous| previous.same_value(&current));
            if !same {
                changed.insert(name.clone());
                snapshot.insert(name.clone(), current);
            }
        }
        changed
    }

    /// Detect changed parent values and re-run the dependent statements
    pub fn refresh_scope(&mut self, id: ScopeId) -> ScopeRefresh {
        let changed = self.detect_changes(id);
        if changed.is_empty() {
            return ScopeRefresh::default();
        }
        let Some(defining) = self.scope(id).defining().cloned() else {
            return ScopeRefresh::default();
        };
        let rerun = defining.select_statements(&changed);
        self.run_statements(id, &defining, &rerun);

        let mut changed: Vec<_> = changed.into_iter().collect();
        changed.sort();
        tracing::debug!(scope = %id, changed = ?changed, rerun = ?rerun, "scope refreshed");
        ScopeRefresh { changed, rerun }
    }

    fn run_statements(&mut self, id: ScopeId, defining: &DefiningExpression, indices: &[usize]) {
        for &index in indices {
            let Some(stmt) = defining.statements().get(index) else {
                continue;
            };
            let mut env = DerivationEnv {
                tree: self,
                scope: id,
                assigned_before: &defining.assigned_before[index],
                parent_first: &defining.parent_first[index],
            };
            if let Err(err) = eval_expr(&stmt.expr, &mut env) {
                tracing::warn!(
                    scope = %id,
                    statement = defining.statement_source(index),
                    error = %err,
                    "defining statement failed"
                );
            }
        }
    }
}
