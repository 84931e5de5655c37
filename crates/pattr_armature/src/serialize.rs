//! HTML serialization.
//!
//! Form elements whose live `value` property was set (by `p-model`) are
//! written with that value as their `value` attribute, so the output
//! reflects what a browser would show.

use pattr_carton::{is_form_value_tag, is_raw_text_tag, is_void_tag};
use pattr_relief::{Document, NodeData, NodeId};

/// Serialize the whole document
pub fn to_html(doc: &Document) -> String {
    inner_html(doc, doc.root())
}

/// Serialize a node including its own tag
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, false, &mut out);
    out
}

/// Serialize the children of a node
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let raw = doc.tag(node).is_some_and(is_raw_text_tag);
    let mut out = String::new();
    for child in doc.children(node) {
        write_node(doc, *child, raw, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, in_raw_text: bool, out: &mut String) {
    match &doc.node(node).data {
        NodeData::Document => {
            for child in doc.children(node) {
                write_node(doc, *child, false, out);
            }
        }
        NodeData::Text(text) => {
            if in_raw_text {
                out.push_str(text);
            } else {
                out.push_str(&htmlize::escape_text(text.as_str()));
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(el) => {
            let tag = el.tag.as_str();
            let live_value = el.value.as_deref().filter(|_| is_form_value_tag(tag));

            out.push('<');
            out.push_str(tag);
            for attr in &el.attributes {
                if live_value.is_some() && attr.name == "value" {
                    continue;
                }
                write_attribute(out, &attr.name, &attr.value);
            }
            if let Some(value) = live_value {
                write_attribute(out, "value", value);
            }
            out.push('>');

            if is_void_tag(tag) {
                return;
            }
            let raw = is_raw_text_tag(tag);
            for child in doc.children(node) {
                write_node(doc, *child, raw, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    if !value.is_empty() {
        out.push_str("=\"");
        out.push_str(&htmlize::escape_attribute(value));
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_serialize_round_trip() {
        let source = r#"<div id="app" hidden><p p-text="msg">a &amp; b</p><br><!--c--></div>"#;
        let (doc, errors) = parse(source);
        assert!(errors.is_empty());
        insta::assert_snapshot!(
            to_html(&doc),
            @r#"<div id="app" hidden><p p-text="msg">a &amp; b</p><br><!--c--></div>"#
        );
    }

    #[test]
    fn test_live_value_replaces_attribute() {
        let (mut doc, _) = parse(r#"<input p-model="name" value="old">"#);
        let input = doc.document_element().unwrap();
        doc.set_value(input, "new \"one\"");
        insta::assert_snapshot!(
            outer_html(&doc, input),
            @r#"<input p-model="name" value="new &quot;one&quot;">"#
        );
    }

    #[test]
    fn test_script_content_is_not_escaped() {
        let (doc, _) = parse(r#"<script type="application/json">{"a": "<b>"}</script>"#);
        let script = doc.document_element().unwrap();
        assert_eq!(inner_html(&doc, script), r#"{"a": "<b>"}"#);
    }
}
