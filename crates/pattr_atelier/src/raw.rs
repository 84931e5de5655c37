//! Raw scope records.
//!
//! Before any scope exists the engine gathers a serializable tree of raw
//! records mirroring the scope-bearing elements of the page. The root JSON
//! may pre-seed nested records under `_p_children`, so scope data can be
//! authored declaratively next to the root data.

use std::collections::BTreeMap;

use pattr_carton::{format_compact, CompactString, FxHashSet};
use pattr_croquis::{Object, Value};
use serde::Serialize;

/// Reserved key holding pre-seeded child records
pub const CHILDREN_KEY: &str = "_p_children";

/// One raw scope record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScope {
    /// Seed values for the scope's local data
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: Object,
    /// Source of the defining expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defining: Option<String>,
    /// Remote data url
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Child records keyed by scope id
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<CompactString, RawScope>,
}

impl RawScope {
    /// Build a record from a JSON-shaped object, splitting off `_p_children`
    pub fn from_object(mut object: Object) -> Self {
        let mut children = BTreeMap::new();
        match object.remove(CHILDREN_KEY) {
            Some(Value::Object(seeds)) => {
                for (key, seed) in seeds {
                    match seed {
                        Value::Object(child) => {
                            children.insert(key, Self::from_object(child));
                        }
                        other => tracing::warn!(
                            "ignoring {} entry '{}': expected an object, found {}",
                            CHILDREN_KEY,
                            key,
                            other.type_name()
                        ),
                    }
                }
            }
            Some(other) => tracing::warn!(
                "ignoring {}: expected an object, found {}",
                CHILDREN_KEY,
                other.type_name()
            ),
            None => {}
        }
        Self {
            data: object,
            defining: None,
            src: None,
            children,
        }
    }

    /// Merge another record into this one; `other` wins on conflicts
    pub fn merge(&mut self, other: RawScope) {
        self.data.extend(other.data);
        if other.defining.is_some() {
            self.defining = other.defining;
        }
        if other.src.is_some() {
            self.src = other.src;
        }
        for (key, child) in other.children {
            self.children.entry(key).or_default().merge(child);
        }
    }

    /// Follow a key path from this record
    pub fn descend(&self, path: &[CompactString]) -> Option<&RawScope> {
        path.iter()
            .try_fold(self, |record, key| record.children.get(key))
    }

    pub fn descend_mut(&mut self, path: &[CompactString]) -> Option<&mut RawScope> {
        path.iter()
            .try_fold(self, |record, key| record.children.get_mut(key))
    }
}

/// Key assignment for the scope-bearing children of one record
#[derive(Debug, Default)]
pub(crate) struct KeyAllocator {
    claimed: FxHashSet<CompactString>,
    position: usize,
}

impl KeyAllocator {
    /// Key for the next scope-bearing element: its `p-id`, or `#<n>` by
    /// position. Repeated keys get a `~<n>` suffix.
    pub(crate) fn next_key(&mut self, explicit: Option<&str>) -> CompactString {
        let position = self.position;
        self.position += 1;
        let base = match explicit {
            Some(id) => CompactString::from(id),
            None => format_compact!("#{}", position),
        };
        if self.claimed.insert(base.clone()) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format_compact!("{}~{}", base, n);
            if self.claimed.insert(candidate.clone()) {
                tracing::warn!(
                    "duplicate scope id '{}' among siblings; using '{}'",
                    base,
                    candidate
                );
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(json: serde_json::Value) -> Object {
        match Value::from_json(json) {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_object_splits_children() {
        let raw = RawScope::from_object(object(serde_json::json!({
            "count": 1,
            "_p_children": {
                "cart": { "items": [], "_p_children": { "line": { "qty": 2 } } },
                "bad": 3
            }
        })));
        assert_eq!(raw.data.len(), 1);
        assert_eq!(raw.children.len(), 1);
        let line = raw
            .descend(&["cart".into(), "line".into()])
            .unwrap();
        assert_eq!(line.data.get("qty"), Some(&Value::from(2)));
    }

    #[test]
    fn test_serialize() {
        let mut raw = RawScope::from_object(object(serde_json::json!({ "count": 1 })));
        raw.children.insert(
            "#0".into(),
            RawScope {
                defining: Some("doubled = count * 2".into()),
                ..RawScope::default()
            },
        );
        insta::assert_snapshot!(
            serde_json::to_string(&raw).unwrap(),
            @r##"{"data":{"count":1},"children":{"#0":{"defining":"doubled = count * 2"}}}"##
        );
    }

    #[test]
    fn test_key_allocator() {
        let mut keys = KeyAllocator::default();
        assert_eq!(keys.next_key(None), "#0");
        assert_eq!(keys.next_key(Some("cart")), "cart");
        assert_eq!(keys.next_key(Some("cart")), "cart~1");
        assert_eq!(keys.next_key(None), "#3");
        assert_eq!(keys.next_key(Some("cart")), "cart~2");
    }

    #[test]
    fn test_merge_prefers_incoming() {
        let mut raw = RawScope::from_object(object(serde_json::json!({ "a": 1, "b": 1 })));
        raw.defining = Some("x = a".into());
        raw.merge(RawScope::from_object(object(serde_json::json!({ "b": 2 }))));
        assert_eq!(raw.data.get("a"), Some(&Value::from(1)));
        assert_eq!(raw.data.get("b"), Some(&Value::from(2)));
        assert_eq!(raw.defining.as_deref(), Some("x = a"));
    }
}
