//! Response repair — turns whatever the provider sent back into a JSON
//! object, no matter how mangled.
//!
//! The ladder never fails: each rung handles a failure mode observed in
//! real provider output (markdown fences, trailing prose, a reply cut off
//! mid-string by the token limit, raw newlines inside string values). When
//! every rung misses, the caller still gets an empty object plus notes, so
//! the lenient record readers produce a schema-complete default record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Maximum length of the raw-response excerpt carried in parsing notes.
const RAW_EXCERPT_LEN: usize = 280;

static FIELD_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    // "key": "value" pairs with no embedded quotes — the salvage rung
    Regex::new(r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*"([^"]*)""#).unwrap()
});

/// Repairs a raw provider reply into a JSON object. Total: malformed input
/// degrades to an empty object with explanatory `parsing_notes` rather
/// than an error.
pub fn repair(raw: &str) -> Value {
    let cleaned = strip_json_fences(raw);
    let truncated = truncate_to_braces(cleaned);

    match serde_json::from_str::<Value>(truncated) {
        Ok(Value::Object(map)) => return Value::Object(map),
        Ok(other) => {
            warn!(got = %json_type(&other), "provider reply parsed but is not an object");
        }
        Err(err) => {
            debug!(%err, "strict parse failed, entering repair ladder");
        }
    }

    let balanced = balance_delimiters(truncated);
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&balanced) {
        debug!("repaired reply by balancing quotes and braces");
        return Value::Object(map);
    }

    let collapsed = collapse_string_newlines(&balanced);
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&collapsed) {
        debug!("repaired reply by collapsing raw newlines in strings");
        return Value::Object(map);
    }

    let harvested = harvest_field_pairs(truncated);
    if !harvested.is_empty() {
        warn!(
            fields = harvested.len(),
            "reply unparseable, salvaged flat string fields"
        );
        let mut map = Map::new();
        for (key, value) in harvested {
            map.insert(key, Value::String(value));
        }
        map.insert(
            "parsing_notes".to_string(),
            json!(["response was malformed; recovered individual fields only"]),
        );
        map.insert("confidence_score".to_string(), json!(0.0));
        return Value::Object(map);
    }

    warn!(len = raw.len(), "reply unrecoverable, returning defaults");
    json!({
        "confidence_score": 0.0,
        "parsing_notes": [
            "response could not be parsed as JSON",
            format!("raw response (truncated): {}", excerpt(raw)),
        ],
    })
}

/// Strips a leading/trailing markdown code fence (```json ... ``` or
/// ``` ... ```), tolerating surrounding whitespace.
pub fn strip_json_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag on the fence line, if any
    let rest = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Cuts the reply down to the outermost `{ ... }` span, discarding prose
/// before the first brace and after the last one.
fn truncate_to_braces(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        (Some(start), _) => &text[start..],
        _ => text,
    }
}

/// Closes a dangling string and any unbalanced braces/brackets. Quote
/// state is tracked with escape awareness so `\"` inside a value does not
/// flip it.
fn balance_delimiters(text: &str) -> String {
    let mut in_string = false;
    let mut escaped = false;
    let mut braces = 0i32;
    let mut brackets = 0i32;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => braces += 1,
            '}' if !in_string => braces -= 1,
            '[' if !in_string => brackets += 1,
            ']' if !in_string => brackets -= 1,
            _ => {}
        }
    }

    let mut out = text.trim_end().trim_end_matches(',').to_string();
    if in_string {
        out.push('"');
    }
    for _ in 0..brackets.max(0) {
        out.push(']');
    }
    for _ in 0..braces.max(0) {
        out.push('}');
    }
    out
}

/// Replaces raw newlines that fall inside string values with spaces.
/// Newlines between tokens are left alone.
fn collapse_string_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = !in_string;
                out.push(ch);
            }
            '\n' | '\r' if in_string => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// Last-resort salvage: pulls flat `"key": "value"` pairs out of text
/// that will never parse as a whole. First occurrence of a key wins.
fn harvest_field_pairs(text: &str) -> Vec<(String, String)> {
    let mut seen = std::collections::HashSet::new();
    let mut pairs = Vec::new();
    for cap in FIELD_PAIR_RE.captures_iter(text) {
        let key = cap[1].to_string();
        if seen.insert(key.clone()) {
            pairs.push((key, cap[2].to_string()));
        }
    }
    pairs
}

fn excerpt(raw: &str) -> String {
    if raw.len() <= RAW_EXCERPT_LEN {
        return raw.to_string();
    }
    let mut cut = RAW_EXCERPT_LEN;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &raw[..cut])
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
