//! Canonical request serialization.
//!
//! The server reconstructs the signing record independently; every rule
//! here must match its implementation byte for byte. Object keys sort by
//! UTF-16 code unit (the order a JavaScript runtime's `sort()` produces),
//! not by Rust's default scalar-value order; the two diverge for keys
//! outside the basic multilingual plane.

use serde_json::Value;
use std::cmp::Ordering;

/// Delimiter between signing-record components.
pub const RECORD_DELIMITER: &str = "||";

/// Serializes request parameters for the signing record.
///
/// GET requests URL-encode each key and value, sort by key, and join as
/// `k=v&k=v` (empty input serializes to the empty string). Every other
/// method serializes to canonical JSON, with empty or keyless params
/// pinned to exactly `{}`.
pub fn serialize_params(method: &str, params: &Value) -> String {
    if method.eq_ignore_ascii_case("GET") {
        serialize_query(params)
    } else {
        serialize_body(params)
    }
}

/// Canonical JSON: arrays in order, object keys sorted by UTF-16 code
/// unit, minimal escaping, no whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Composes the signing record both sides HMAC.
pub fn compose_signing_record(
    timestamp_ms: u64,
    nonce: &str,
    method: &str,
    path: &str,
    serialized_params: &str,
    risk_score: u8,
    fingerprint_json: &str,
) -> String {
    [
        timestamp_ms.to_string(),
        nonce.to_string(),
        method.to_uppercase(),
        path.to_string(),
        serialized_params.to_string(),
        risk_score.to_string(),
        fingerprint_json.to_string(),
    ]
    .join(RECORD_DELIMITER)
}

fn serialize_query(params: &Value) -> String {
    let Some(map) = params.as_object() else {
        return String::new();
    };
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| cmp_utf16(a.0, b.0));
    entries
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&scalar_text(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn serialize_body(params: &Value) -> String {
    match params.as_object() {
        Some(map) if !map.is_empty() => canonical_json(params),
        Some(_) => "{}".to_string(),
        None if params.is_null() => "{}".to_string(),
        None => canonical_json(params),
    }
}

/// Query-value text: strings verbatim, everything else in compact JSON
/// form.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn cmp_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(text) => write_escaped(text, out),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| cmp_utf16(a.0, b.0));
            out.push('{');
            for (index, (key, item)) in entries.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

fn write_escaped(text: &str, out: &mut String) {
    out.push('"');
    for character in text.chars() {
        match character {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            control if (control as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", control as u32));
            }
            printable => out.push(printable),
        }
    }
    out.push('"');
}
