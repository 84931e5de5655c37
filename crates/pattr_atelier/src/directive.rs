//! Directive attribute names.
//!
//! Grammar: `directive[:modifier.arg1.arg2][:modifier2...]`, e.g.
//! `p-html:trim.300:allow.p.h1`. Event attributes reuse the same shape:
//! `p-on:click.once` and `@click.once.stop` both name the `click` event
//! with the `once` (and `stop`) modifiers.

use pattr_carton::{CompactString, SmallVec};

/// Attributes the engine itself consumes; never dispatched as directives
pub const SCOPE_ATTRIBUTES: &[&str] = &["p-data", "p-scope", "p-id", "p-src"];

/// Prefix of long-form event attributes
pub const EVENT_PREFIX: &str = "p-on:";

/// Modifier arguments (usually zero to two)
pub type ModifierArgs = SmallVec<[CompactString; 2]>;

/// One `:name.arg...` group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: CompactString,
    pub args: ModifierArgs,
}

/// Ordered modifier groups of a directive attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers(Vec<Modifier>);

impl Modifiers {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Arguments of the first group named `name`
    pub fn get(&self, name: &str) -> Option<&[CompactString]> {
        self.0
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.args.as_slice())
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.0.iter()
    }
}

/// A parsed directive attribute name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveName {
    pub id: CompactString,
    pub modifiers: Modifiers,
}

impl DirectiveName {
    pub fn parse(attribute: &str) -> Self {
        let mut groups = attribute.split(':');
        let id = CompactString::from(groups.next().unwrap_or_default());
        let modifiers = groups
            .filter(|group| !group.is_empty())
            .map(|group| {
                let mut parts = group.split('.');
                let name = CompactString::from(parts.next().unwrap_or_default());
                let args = parts.map(CompactString::from).collect();
                Modifier { name, args }
            })
            .collect();
        Self {
            id,
            modifiers: Modifiers(modifiers),
        }
    }
}

/// Flags an event attribute may carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventModifiers {
    /// Run only when the element itself is the event target
    pub self_only: bool,
    /// Remove the listener after its first run
    pub once: bool,
    /// Do not bubble past this element
    pub stop: bool,
}

/// Parse `@event.mod...` or `p-on:event.mod...`
pub fn parse_event_attribute(attribute: &str) -> Option<(CompactString, EventModifiers)> {
    let rest = attribute
        .strip_prefix('@')
        .or_else(|| attribute.strip_prefix(EVENT_PREFIX))?;
    let mut parts = rest.split('.');
    let event = parts.next().filter(|e| !e.is_empty())?;
    let mut modifiers = EventModifiers::default();
    for part in parts {
        match part {
            "self" => modifiers.self_only = true,
            "once" => modifiers.once = true,
            "stop" => modifiers.stop = true,
            other => tracing::warn!("unknown event modifier '{}' on {}", other, attribute),
        }
    }
    Some((CompactString::from(event), modifiers))
}

/// Whether an attribute belongs to the engine rather than a directive
pub fn is_engine_attribute(attribute: &str) -> bool {
    SCOPE_ATTRIBUTES.contains(&attribute)
        || attribute.starts_with('@')
        || attribute.starts_with(EVENT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive_with_modifiers() {
        let name = DirectiveName::parse("p-html:trim.50:allow.p.b");
        assert_eq!(name.id, "p-html");
        assert_eq!(name.modifiers.len(), 2);
        assert_eq!(name.modifiers.get("trim"), Some(&["50".into()][..]));
        assert_eq!(
            name.modifiers.get("allow"),
            Some(&["p".into(), "b".into()][..])
        );
        let order: Vec<_> = name.modifiers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(order, vec!["trim", "allow"]);
    }

    #[test]
    fn test_parse_plain_directive() {
        let name = DirectiveName::parse("p-text");
        assert_eq!(name.id, "p-text");
        assert!(name.modifiers.is_empty());

        let name = DirectiveName::parse("p-model:number");
        assert!(name.modifiers.has("number"));
        assert_eq!(name.modifiers.get("number"), Some(&[][..]));
    }

    #[test]
    fn test_parse_event_attribute() {
        assert_eq!(
            parse_event_attribute("@click"),
            Some(("click".into(), EventModifiers::default()))
        );
        let (event, modifiers) = parse_event_attribute("p-on:submit.once.stop").unwrap();
        assert_eq!(event, "submit");
        assert!(modifiers.once && modifiers.stop && !modifiers.self_only);
        assert_eq!(parse_event_attribute("p-text"), None);
        assert_eq!(parse_event_attribute("@"), None);
    }

    #[test]
    fn test_engine_attributes() {
        assert!(is_engine_attribute("p-data"));
        assert!(is_engine_attribute("@input"));
        assert!(is_engine_attribute("p-on:click"));
        assert!(!is_engine_attribute("p-text"));
    }
}
