//! Event listeners and dispatch.
//!
//! Listeners come from `@event` / `p-on:event` attributes and from
//! `p-model`. Dispatch bubbles from the target through its ancestors;
//! each listener runs in the scope its element is bound to and then
//! refreshes that scope's region.

use std::rc::Rc;

use pattr_carton::CompactString;
use pattr_croquis::expression::{assign_target, AssignTarget};
use pattr_croquis::{Program, ScopeEnv, ScopeId, Value};
use pattr_relief::NodeId;

use crate::directive::EventModifiers;
use crate::engine::Engine;
use crate::errors::EngineError;
use crate::refresh::RefreshReport;

/// A DOM-style event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: CompactString,
    /// Current value of the target, for `input` events
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// An `input` event carrying the target's new value
    pub fn input(value: impl Into<String>) -> Self {
        Self::new("input").with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug)]
pub(crate) enum ListenerAction {
    /// Statements of an event attribute
    Run(Program),
    /// Two-way binding of `p-model`
    Model {
        target: AssignTarget,
        number: bool,
        trim: bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub(crate) event: CompactString,
    pub(crate) modifiers: EventModifiers,
    pub(crate) action: Rc<ListenerAction>,
    /// A `once` listener that already fired
    pub(crate) spent: bool,
}

impl Listener {
    pub(crate) fn new(
        event: CompactString,
        modifiers: EventModifiers,
        action: ListenerAction,
    ) -> Self {
        Self {
            event,
            modifiers,
            action: Rc::new(action),
            spent: false,
        }
    }
}

/// What a dispatch did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Listeners that ran
    pub handlers: usize,
    /// One refresh per listener run
    pub refreshes: Vec<RefreshReport>,
}

impl Engine {
    /// Dispatch `event` at `target`, bubbling through its ancestors
    pub fn dispatch(&mut self, target: NodeId, event: &Event) -> Result<DispatchReport, EngineError> {
        if !self.hydrated {
            return Err(EngineError::NotHydrated);
        }
        if !self.document.is_element(target) {
            return Err(EngineError::UnknownNode(target));
        }
        tracing::debug!(target = %target, event = %event.name, "dispatch");

        let path: Vec<NodeId> = std::iter::once(target)
            .chain(self.document.ancestors(target))
            .collect();
        let mut report = DispatchReport::default();

        for node in path {
            let Some(scope) = self.scope_of(node) else {
                continue;
            };
            let mut stop = false;
            let count = self.listeners.get(&node).map_or(0, Vec::len);
            for index in 0..count {
                let Some(listener) = self.listeners.get_mut(&node).and_then(|l| l.get_mut(index))
                else {
                    break;
                };
                if listener.spent || listener.event != event.name {
                    continue;
                }
                if listener.modifiers.self_only && node != target {
                    continue;
                }
                if listener.modifiers.once {
                    listener.spent = true;
                }
                stop |= listener.modifiers.stop;
                let action = Rc::clone(&listener.action);

                self.run_listener(node, scope, &action, event);
                report.handlers += 1;
                let mut refresh = RefreshReport::default();
                self.request_refresh(scope, &mut refresh);
                report.refreshes.push(refresh);
            }
            if stop {
                break;
            }
        }
        Ok(report)
    }

    fn run_listener(&mut self, node: NodeId, scope: ScopeId, action: &ListenerAction, event: &Event) {
        match action {
            ListenerAction::Run(program) => {
                if let Err(err) = program.execute(&mut ScopeEnv::new(&mut self.scopes, scope)) {
                    tracing::warn!(node = %node, event = %event.name, "handler failed: {}", err);
                }
            }
            ListenerAction::Model {
                target,
                number,
                trim,
            } => {
                let Some(raw) = &event.value else {
                    tracing::debug!(node = %node, "input event without a value");
                    return;
                };
                self.document.set_value(node, raw.as_str());
                let value = model_value(raw, *number, *trim);
                let mut env = ScopeEnv::new(&mut self.scopes, scope);
                if let Err(err) = assign_target(target, value, &mut env) {
                    tracing::warn!(node = %node, "p-model write failed: {}", err);
                }
            }
        }
    }
}

/// Convert an input's text for `p-model`. `number` keeps the text when it
/// does not parse as a number.
fn model_value(raw: &str, number: bool, trim: bool) -> Value {
    let text = if trim { raw.trim() } else { raw };
    if number {
        match text.trim().parse::<f64>() {
            Ok(n) if !n.is_nan() => return Value::Number(n),
            _ => {}
        }
    }
    Value::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_value() {
        assert_eq!(model_value(" hi ", false, false), Value::from(" hi "));
        assert_eq!(model_value(" hi ", false, true), Value::from("hi"));
        assert_eq!(model_value("42", true, false), Value::Number(42.0));
        assert_eq!(model_value("4x", true, false), Value::from("4x"));
        assert_eq!(model_value(" 1.5 ", true, true), Value::Number(1.5));
    }

    #[test]
    fn test_event_builders() {
        let event = Event::input("abc");
        assert_eq!(event.name, "input");
        assert_eq!(event.value.as_deref(), Some("abc"));
        assert_eq!(Event::new("click").value, None);
    }
}
