//! `{instruction:key}` placeholder substitution.
//!
//! The engine is instruction-agnostic: resolution goes through a
//! [`SubstitutionScope`], and the component runtime supplies the built-in
//! instructions (`class`, `data`, `label`, `self`, `config`).
//! Substitution is deterministic and never fails; everything unresolvable
//! becomes the empty string.

use serde_json::Value;
use std::rc::Rc;
use tracing::warn;

/// Resolves one placeholder to a value.
///
/// Returning `None` substitutes the empty string. Non-primitive values
/// (arrays, objects) also substitute empty.
pub trait SubstitutionScope {
    fn resolve(&self, instruction: &str, key: &str) -> Option<Value>;
}

/// Scope resolving nothing. Every placeholder becomes empty.
pub struct EmptyScope;

impl SubstitutionScope for EmptyScope {
    fn resolve(&self, _instruction: &str, _key: &str) -> Option<Value> {
        None
    }
}

/// A template body: literal markup or a producer invoked at compile time.
#[derive(Clone)]
pub enum Template {
    Markup(String),
    Producer(Rc<dyn Fn() -> String>),
}

impl Template {
    /// The markup to substitute, producing it if necessary.
    #[must_use]
    pub fn realize(&self) -> String {
        match self {
            Self::Markup(s) => s.clone(),
            Self::Producer(f) => f(),
        }
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Self::Markup(s.to_string())
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Self::Markup(s)
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markup(s) => f.debug_tuple("Markup").field(s).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Replaces every `{instruction:key}` placeholder in `template`.
///
/// A placeholder is a brace pair whose body is `word:rest` with an
/// alphanumeric instruction word. Anything else (unmatched braces, no
/// colon, spaces in the instruction) is copied through literally.
#[must_use]
pub fn substitute(template: &str, scope: &dyn SubstitutionScope) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        match tail.find('}').and_then(|close| {
            split_placeholder(&tail[..close]).map(|(instr, key)| (instr, key, close))
        }) {
            Some((instruction, key, close)) => {
                out.push_str(&resolve_text(scope, instruction, key));
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn split_placeholder(body: &str) -> Option<(&str, &str)> {
    let (instruction, key) = body.split_once(':')?;
    if instruction.is_empty() || !instruction.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((instruction, key))
}

fn resolve_text(scope: &dyn SubstitutionScope, instruction: &str, key: &str) -> String {
    match scope.resolve(instruction, key) {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            warn!(%instruction, %key, kind = value_kind(&other), "non-primitive substitution");
            String::new()
        }
        None => String::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Looks up a dot-separated path inside a JSON value. Array segments may
/// be numeric indexes.
#[must_use]
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MapScope(Value);

    impl SubstitutionScope for MapScope {
        fn resolve(&self, instruction: &str, key: &str) -> Option<Value> {
            self.0.get(instruction)?.get(key).cloned()
        }
    }

    fn scope() -> MapScope {
        MapScope(json!({
            "data": {"name": "Ada", "count": 3, "ok": true, "list": [1, 2]},
            "class": {"root": "panel-root"},
        }))
    }

    #[test]
    fn substitutes_primitives() {
        let out = substitute("<b class=\"{class:root}\">{data:name} x{data:count} {data:ok}</b>", &scope());
        assert_eq!(out, "<b class=\"panel-root\">Ada x3 true</b>");
    }

    #[test]
    fn unknown_instruction_and_key_become_empty() {
        assert_eq!(substitute("[{nope:x}][{data:missing}]", &scope()), "[][]");
    }

    #[test]
    fn non_primitive_value_becomes_empty() {
        assert_eq!(substitute("[{data:list}]", &scope()), "[]");
    }

    #[test]
    fn malformed_braces_pass_through() {
        assert_eq!(substitute("a { b } {x} {:y} {", &scope()), "a { b } {x} {:y} {");
    }

    #[test]
    fn substitution_is_deterministic() {
        let template = "{class:root}-{data:count}";
        let first = substitute(template, &scope());
        assert_eq!(first, substitute(template, &scope()));
        assert_eq!(first, "panel-root-3");
    }

    #[test]
    fn template_realize_covers_both_forms() {
        assert_eq!(Template::from("hi").realize(), "hi");
        let dynamic = Template::Producer(Rc::new(|| "made".to_string()));
        assert_eq!(dynamic.realize(), "made");
    }

    #[test]
    fn resolve_path_walks_objects_and_arrays() {
        let value = json!({"a": {"b": [10, {"c": "deep"}]}});
        assert_eq!(resolve_path(&value, "a.b.0"), Some(&json!(10)));
        assert_eq!(resolve_path(&value, "a.b.1.c"), Some(&json!("deep")));
        assert_eq!(resolve_path(&value, "a.x"), None);
        assert_eq!(resolve_path(&value, "a.b.9"), None);
    }
}
