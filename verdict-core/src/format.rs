//! Value formatting for failure messages
//!
//! The default display used when an assertion reports "But was: ...". The
//! execution context carries a `ValueFormatter` so callers can swap in their
//! own rendering for a scope.

use crate::value::Value;
use std::fmt::Write;
use std::sync::Arc;

/// A swappable value-to-display-string function.
pub type ValueFormatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// The default formatter.
pub fn default_formatter() -> ValueFormatter {
    Arc::new(display_value)
}

/// Render a value for a failure message. Cycle-safe: a container already on
/// the rendering path prints as `<circular>`.
pub fn display_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, &mut Vec::new());
    out
}

fn write_value(out: &mut String, value: &Value, visiting: &mut Vec<usize>) {
    if let Some(id) = value.identity() {
        if visiting.contains(&id) {
            out.push_str("<circular>");
            return;
        }
        visiting.push(id);
    }

    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        Value::Int(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::Float(n) => {
            // {:?} keeps a trailing ".0" so floats stay visually distinct
            // from ints.
            let _ = write!(out, "{:?}", n);
        }
        Value::Str(s) => {
            let _ = write!(out, "{:?}", s);
        }
        Value::Duration(d) => {
            let _ = write!(out, "{:?}", d);
        }
        Value::Tuple(slots) => {
            out.push('(');
            for (i, slot) in slots.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, slot, visiting);
            }
            out.push(')');
        }
        Value::List(handle) => {
            out.push('[');
            for (i, item) in handle.snapshot().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, visiting);
            }
            out.push(']');
        }
        Value::Map(handle) => {
            out.push('{');
            for (i, (key, item)) in handle.snapshot().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{:?}: ", key);
                write_value(out, item, visiting);
            }
            out.push('}');
        }
        Value::Record(handle) => {
            out.push_str("{ ");
            for (i, (field, item)) in handle.snapshot().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{} = ", field);
                write_value(out, item, visiting);
            }
            out.push_str(" }");
        }
        Value::Custom(inner) => out.push_str(&inner.describe()),
    }

    if value.identity().is_some() {
        visiting.pop();
    }
}

// =============================================================================
// TESTS
// =============================================================================
