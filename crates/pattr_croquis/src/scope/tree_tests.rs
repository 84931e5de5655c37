//! Tests for the scope tree.

use std::rc::Rc;

use insta::assert_snapshot;
use pattr_relief::NodeId;

use super::*;
use crate::expression::{evaluate, execute};
use crate::tracking::DefiningExpression;
use crate::value::Value;

fn defined(tree: &mut ScopeTree, parent: ScopeId, key: &str, source: &str) -> ScopeId {
    let id = tree.add_child(parent, ScopeKind::Defined, key, None);
    tree.set_defining(id, Rc::new(DefiningExpression::parse(source).unwrap()));
    tree.initialize_scope(id);
    id
}

#[test]
fn test_inheritance_through_multiple_levels() {
    let mut tree = ScopeTree::new();
    tree.set_local(ScopeId::ROOT, "theme", Value::from("dark"));
    let a = tree.add_child(ScopeId::ROOT, ScopeKind::Defined, "a", None);
    let b = tree.add_child(a, ScopeKind::Defined, "b", None);
    let c = tree.add_child(b, ScopeKind::Defined, "c", None);

    assert_eq!(tree.lookup(c, "theme"), Value::from("dark"));
    tree.set_local(b, "theme", Value::from("light"));
    assert_eq!(tree.lookup(c, "theme"), Value::from("light"));
    assert_eq!(tree.lookup(a, "theme"), Value::from("dark"));
    assert_eq!(tree.lookup(c, "nothing"), Value::Undefined);
}

#[test]
fn test_write_locality() {
    let mut tree = ScopeTree::new();
    tree.set_local(ScopeId::ROOT, "count", Value::from(1));
    let child = defined(&mut tree, ScopeId::ROOT, "#0", "count = count + 1; other = 5");

    execute("count += 10", &mut ScopeEnv::new(&mut tree, child)).unwrap();

    assert_eq!(tree.lookup(child, "count"), Value::from(12));
    assert_eq!(tree.lookup(ScopeId::ROOT, "count"), Value::from(1));
    assert!(!tree.scope(ScopeId::ROOT).has_local("other"));
}

#[test]
fn test_scope_env_reads_through_chain() {
    let mut tree = ScopeTree::new();
    tree.set_local(ScopeId::ROOT, "price", Value::from(3));
    let child = tree.add_child(ScopeId::ROOT, ScopeKind::Defined, "#0", None);
    tree.set_local(child, "qty", Value::from(4));

    let total = evaluate("price * qty", &mut ScopeEnv::new(&mut tree, child)).unwrap();
    assert_eq!(total, Value::from(12));
}

#[test]
fn test_chain_and_within() {
    let mut tree = ScopeTree::new();
    let a = tree.add_child(ScopeId::ROOT, ScopeKind::Defined, "a", None);
    let b = tree.add_child(a, ScopeKind::Defined, "b", None);
    let side = tree.add_child(ScopeId::ROOT, ScopeKind::Defined, "side", None);

    assert_eq!(tree.chain(b).collect::<Vec<_>>(), vec![b, a, ScopeId::ROOT]);
    assert!(tree.is_within(b, a));
    assert!(tree.is_within(b, ScopeId::ROOT));
    assert!(!tree.is_within(side, a));
    assert_eq!(tree.scope(ScopeId::ROOT).children.as_slice(), &[a, side]);
}

#[test]
fn test_find_by_element() {
    let mut tree = ScopeTree::new();
    let scope = tree.add_child(ScopeId::ROOT, ScopeKind::Remote, "r", Some(NodeId::new(7)));
    assert_eq!(tree.find_by_element(NodeId::new(7)), Some(scope));
    assert_eq!(tree.find_by_element(NodeId::new(8)), None);
}

#[test]
fn test_display() {
    let mut tree = ScopeTree::new();
    tree.set_local(ScopeId::ROOT, "count", Value::from(1));
    tree.set_local(ScopeId::ROOT, "title", Value::from("x"));
    let a = tree.add_child(ScopeId::ROOT, ScopeKind::Defined, "#0", Some(NodeId::new(3)));
    tree.set_defining(
        a,
        Rc::new(DefiningExpression::parse("doubled = count * 2").unwrap()),
    );
    tree.initialize_scope(a);
    defined(&mut tree, ScopeId::ROOT, "side", "label = title");
    defined(&mut tree, a, "#0", "quad = doubled * 2");

    assert_snapshot!(tree.to_display(), @r#"
    @0 root
      data: {count=1, title="x"}
      @1 defined key=#0 element=#3
        defining: doubled = count * 2
        data: {doubled=2}
        snapshot: {count=1}
        @3 defined key=#0
          defining: quad = doubled * 2
          data: {quad=4}
          snapshot: {doubled=2}
      @2 defined key=side
        defining: label = title
        data: {label="x"}
        snapshot: {title="x"}
    "#);
}
