//! Replacement codes and message expressions for behavior templates.
//!
//! Template fields use `%%code%%` replacement codes resolved against a JSON
//! scope (`%%user.email%%`, `%%order.items.0%%`). The `message` field is
//! rendered as a sandboxed `minijinja` template against the same scope, which
//! gives conditionals and loops without exposing anything beyond the scope.
//! Codes in a message are bound as template values, never spliced into the
//! template source.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Separator used when a replacement code resolves to a list.
pub const MULTI_VALUE_DELIMITER: &str = ", ";

/// Scope key holding the resolved codes of a message.
pub const MESSAGE_CODES_VAR: &str = "__codes";

/// Regex pattern matching `%%code%%` tokens, with optional dotted paths.
pub const CODE_PATTERN: &str = r"%%([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)%%";

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CODE_PATTERN).expect("valid regex"));

static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Replacement codes
// ---------------------------------------------------------------------------

/// Replace every `%%code%%` in `text` with its value from `scope`.
///
/// Code names are matched case-insensitively. Lists are joined with
/// [`MULTI_VALUE_DELIMITER`], `null` becomes an empty string, and codes that
/// do not resolve to a scalar or list are left as written.
pub fn replace_codes(text: &str, scope: &Map<String, Value>) -> String {
    if !text.contains("%%") {
        return text.to_string();
    }
    CODE_RE
        .replace_all(text, |caps: &Captures| {
            lookup(scope, &caps[1])
                .and_then(render_value)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn lookup<'a>(scope: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = get_ignore_case(scope, parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => get_ignore_case(map, part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn get_ignore_case<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(render_value)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_DELIMITER),
        ),
        Value::Object(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Message expressions
// ---------------------------------------------------------------------------

/// Render `source` as a `minijinja` template bound only to `scope`.
pub fn evaluate_expression(source: &str, scope: &Map<String, Value>) -> Result<String, CoreError> {
    let env = minijinja::Environment::new();
    env.render_str(source, scope)
        .map_err(|e| CoreError::Template(e.to_string()))
}

/// Render a behavior message.
///
/// Each resolvable `%%code%%` becomes a lookup into [`MESSAGE_CODES_VAR`], so
/// scope values reach the output as data and cannot alter the template.
pub fn render_message(source: &str, scope: &Map<String, Value>) -> Result<String, CoreError> {
    let mut codes = Vec::new();
    let bound = CODE_RE.replace_all(source, |caps: &Captures| {
        match lookup(scope, &caps[1]).and_then(render_value) {
            Some(value) => {
                codes.push(Value::String(value));
                format!("{{{{ {MESSAGE_CODES_VAR}[{}] }}}}", codes.len() - 1)
            }
            None => caps[0].to_string(),
        }
    });

    let mut scope = scope.clone();
    scope.insert(MESSAGE_CODES_VAR.to_string(), Value::Array(codes));
    evaluate_expression(&bound, &scope)
}

// ---------------------------------------------------------------------------
// Multi-valued fields
// ---------------------------------------------------------------------------

/// Parse a stored multi-valued field (headers, attachments).
///
/// A JSON array is decoded as-is; anything else is treated as a list
/// delimited by line breaks. Blank entries are dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw.trim()) {
        return items
            .iter()
            .filter_map(render_value)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    LINE_BREAK_RE
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
