//! Element tree node types.
//!
//! All nodes live in a single arena owned by [`Document`]. Nodes removed
//! from the tree are detached (their parent is cleared) but keep their slot,
//! so a `NodeId` handed out once never points at a different node.

use pattr_carton::CompactString;
use serde::Serialize;

/// Node identifier (index into the document arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The document node
    pub const DOCUMENT: Self = Self(0);

    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline(always)]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum NodeType {
    Document = 0,
    Element = 1,
    Text = 2,
    Comment = 3,
}

/// A single attribute, kept in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: CompactString,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<CompactString>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element payload
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    pub tag: CompactString,
    pub attributes: Vec<Attribute>,
    /// The live `value` property of form elements (not the attribute)
    pub value: Option<String>,
}

/// Node payload
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// The element tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                id: NodeId::DOCUMENT,
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    /// Number of nodes ever allocated (detached ones included)
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: impl Into<CompactString>) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.into(),
            ..ElementData::default()
        }))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Remove a node from its parent's child list
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != node);
        }
    }

    /// Replace an element with its own children, in place
    pub fn unwrap_element(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.index()].parent else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[node.index()].children);
        for child in &children {
            self.nodes[child.index()].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.index()].children;
        if let Some(position) = siblings.iter().position(|c| *c == node) {
            siblings.splice(position..=position, children);
        }
        self.nodes[node.index()].parent = None;
    }

    /// Detach every child of `node`
    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.index()].children);
        for child in children {
            self.nodes[child.index()].parent = None;
        }
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a node. Panics on an id not produced by this document.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    #[inline]
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.index()).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    #[inline]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children in document order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.is_element(*c))
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// All descendants of `id` in pre-order, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// The first element child of the document node (usually `<html>`)
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(NodeId::DOCUMENT).next()
    }

    /// Find the first attached element with the given `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(NodeId::DOCUMENT)
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id)
            .map(|el| el.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    #[inline]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute, replacing the value in place if it already exists
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            let value = value.into();
            match el.attributes.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value,
                None => el.attributes.push(Attribute::new(name, value)),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.retain(|a| a.name != name);
        }
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeData::Text(text) = &self.node(node).data {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: impl Into<String>) {
        self.clear_children(id);
        let text = text.into();
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// Replace the data of a text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(Node {
            data: NodeData::Text(current),
            ..
        }) = self.nodes.get_mut(id.index())
        {
            *current = text.into();
        }
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|el| el.value.as_deref())
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.value = Some(value.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        doc.append_child(doc.root(), html);
        let div = doc.create_element("div");
        doc.set_attribute(div, "id", "app");
        doc.append_child(html, div);
        let span = doc.create_element("span");
        doc.append_child(div, span);
        let text = doc.create_text("hello");
        doc.append_child(span, text);
        (doc, html, div, span)
    }

    #[test]
    fn test_tree_structure() {
        let (doc, html, div, span) = sample();
        assert_eq!(doc.document_element(), Some(html));
        assert_eq!(doc.parent(span), Some(div));
        assert_eq!(doc.ancestors(span).collect::<Vec<_>>(), vec![div, html, NodeId::DOCUMENT]);
        assert!(doc.contains(html, span));
        assert!(!doc.contains(span, div));
        assert_eq!(doc.get_element_by_id("app"), Some(div));
        assert_eq!(doc.text_content(html), "hello");
    }

    #[test]
    fn test_attributes_keep_order() {
        let (mut doc, _, div, _) = sample();
        doc.set_attribute(div, "p-text", "msg");
        doc.set_attribute(div, "id", "main");
        let names: Vec<_> = doc.attributes(div).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "p-text"]);
        assert_eq!(doc.attribute(div, "id"), Some("main"));
        doc.remove_attribute(div, "id");
        assert!(!doc.has_attribute(div, "id"));
    }

    #[test]
    fn test_set_text_content_detaches_children() {
        let (mut doc, _, div, span) = sample();
        doc.set_text_content(div, "replaced");
        assert_eq!(doc.parent(span), None);
        assert_eq!(doc.text_content(div), "replaced");
        assert_eq!(doc.element_children(div).count(), 0);
    }

    #[test]
    fn test_value_property_is_not_an_attribute() {
        let (mut doc, _, div, _) = sample();
        let input = doc.create_element("input");
        doc.append_child(div, input);
        doc.set_value(input, "typed");
        assert_eq!(doc.value(input), Some("typed"));
        assert!(!doc.has_attribute(input, "value"));
    }

    #[test]
    fn test_unwrap_element_keeps_position() {
        let (mut doc, _, div, span) = sample();
        let before = doc.create_text("a");
        doc.append_child(div, before);
        let after = doc.create_element("i");
        doc.append_child(div, after);
        // div: [span("hello"), "a", <i>]
        doc.unwrap_element(span);
        assert_eq!(doc.parent(span), None);
        assert_eq!(doc.children(div).len(), 3);
        assert_eq!(doc.text_content(div), "helloa");
        assert_eq!(doc.children(div)[2], after);
    }

    #[test]
    fn test_set_text() {
        let (mut doc, _, div, span) = sample();
        let text = doc.children(span)[0];
        doc.set_text(text, "bye");
        doc.set_text(span, "ignored");
        assert_eq!(doc.text_content(div), "bye");
    }
}
