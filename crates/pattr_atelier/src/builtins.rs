//! Built-in directives.

use pattr_armature::parse_fragment_into;
use pattr_carton::{is_raw_text_tag, truncate_chars, CompactString};
use pattr_croquis::Value;
use pattr_relief::{Document, NodeData, NodeId};

use crate::directive::Modifiers;
use crate::registry::DirectiveContext;

/// `p-text`: replace the content with the value's text
pub fn text(ctx: &mut DirectiveContext<'_>, value: &Value, _modifiers: &Modifiers) {
    ctx.doc.set_text_content(ctx.element, value.to_text());
}

/// `p-html`: replace the content with the value parsed as HTML.
///
/// - `allow.<tag>...` keeps only the listed tags; other elements are
///   replaced by their children (raw-text elements are dropped)
/// - `trim.<n>` truncates the text content to `n` characters
pub fn html(ctx: &mut DirectiveContext<'_>, value: &Value, modifiers: &Modifiers) {
    let element = ctx.element;
    ctx.doc.clear_children(element);
    let errors = parse_fragment_into(ctx.doc, element, &value.to_text());
    if !errors.is_empty() {
        tracing::debug!(node = %element, errors = errors.len(), "p-html content had parse errors");
    }
    if let Some(allowed) = modifiers.get("allow") {
        keep_allowed_tags(ctx.doc, element, allowed);
    }
    let limit = modifiers
        .get("trim")
        .and_then(|args| args.first())
        .and_then(|n| n.parse::<usize>().ok());
    if let Some(limit) = limit {
        truncate_text(ctx.doc, element, limit);
    }
}

/// `p-show`: toggle `display` in the inline style
pub fn show(ctx: &mut DirectiveContext<'_>, value: &Value, _modifiers: &Modifiers) {
    let display = if value.is_truthy() { "block" } else { "none" };
    let style = set_style_property(
        ctx.doc.attribute(ctx.element, "style").unwrap_or_default(),
        "display",
        display,
    );
    ctx.doc.set_attribute(ctx.element, "style", style);
}

/// `p-model`: mirror the bound variable into the element's value
pub fn model(ctx: &mut DirectiveContext<'_>, value: &Value, _modifiers: &Modifiers) {
    ctx.doc.set_value(ctx.element, value.to_text());
}

fn keep_allowed_tags(doc: &mut Document, host: NodeId, allowed: &[CompactString]) {
    for node in doc.descendants(host).into_iter().skip(1) {
        let Some(tag) = doc.tag(node) else {
            continue;
        };
        if allowed.iter().any(|a| a.eq_ignore_ascii_case(tag)) {
            continue;
        }
        if is_raw_text_tag(tag) {
            doc.detach(node);
        } else {
            doc.unwrap_element(node);
        }
    }
}

fn truncate_text(doc: &mut Document, host: NodeId, limit: usize) {
    let mut budget = limit;
    for node in doc.descendants(host) {
        let NodeData::Text(text) = &doc.node(node).data else {
            continue;
        };
        let len = text.chars().count();
        if len <= budget {
            budget -= len;
            continue;
        }
        let kept = truncate_chars(text, budget).to_string();
        budget = 0;
        doc.set_text(node, kept);
    }
}

/// Set one declaration of an inline style, keeping the others in order
fn set_style_property(style: &str, property: &str, value: &str) -> String {
    let mut declarations: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter(|d| {
            d.split(':')
                .next()
                .is_some_and(|name| !name.trim().eq_ignore_ascii_case(property))
        })
        .collect();
    let own = format!("{}: {}", property, value);
    declarations.push(&own);
    declarations.join("; ")
}

#[cfg(test)]
mod tests {
    use pattr_armature::{inner_html, outer_html, parse};
    use pattr_croquis::ScopeId;

    use super::*;
    use crate::directive::DirectiveName;

    fn apply(
        source: &str,
        attribute: &str,
        value: Value,
        directive: fn(&mut DirectiveContext<'_>, &Value, &Modifiers),
    ) -> (Document, NodeId) {
        let (mut doc, _) = parse(source);
        let el = doc.document_element().unwrap();
        let name = DirectiveName::parse(attribute);
        let mut ctx = DirectiveContext::new(&mut doc, el, ScopeId::ROOT);
        directive(&mut ctx, &value, &name.modifiers);
        (doc, el)
    }

    #[test]
    fn test_text_replaces_children() {
        let (doc, el) = apply("<p><b>old</b></p>", "p-text", Value::from("<new>"), text);
        assert_eq!(inner_html(&doc, el), "&lt;new&gt;");

        let (doc, el) = apply("<p>old</p>", "p-text", Value::Null, text);
        assert_eq!(inner_html(&doc, el), "");
    }

    #[test]
    fn test_html_parses_fragment() {
        let (doc, el) = apply(
            "<div></div>",
            "p-html",
            Value::from("<b>bold</b> <i>it</i>"),
            html,
        );
        insta::assert_snapshot!(inner_html(&doc, el), @"<b>bold</b> <i>it</i>");
    }

    #[test]
    fn test_html_allow_unwraps_other_tags() {
        let (doc, el) = apply(
            "<div></div>",
            "p-html:allow.p.b",
            Value::from("<p>a <i>b</i> <b>c</b></p><script>x()</script>"),
            html,
        );
        insta::assert_snapshot!(inner_html(&doc, el), @"<p>a b <b>c</b></p>");
    }

    #[test]
    fn test_html_trim() {
        let (doc, el) = apply(
            "<div></div>",
            "p-html:trim.5",
            Value::from("<b>abc</b>defgh<i>ij</i>"),
            html,
        );
        insta::assert_snapshot!(inner_html(&doc, el), @"<b>abc</b>de<i></i>");
    }

    #[test]
    fn test_show_keeps_other_declarations() {
        let (doc, el) = apply(
            r#"<p style="color: red; display: block"></p>"#,
            "p-show",
            Value::Bool(false),
            show,
        );
        insta::assert_snapshot!(outer_html(&doc, el), @r#"<p style="color: red; display: none"></p>"#);
    }

    #[test]
    fn test_model_sets_value_property() {
        let (doc, el) = apply(r#"<input value="a">"#, "p-model", Value::from(3), model);
        assert_eq!(doc.value(el), Some("3"));
        assert_eq!(doc.attribute(el, "value"), Some("a"));
    }
}
