//! HTML-escaping of untrusted text before it is stored.
//!
//! This is a storage-side measure only; rendering code still has to encode output.

use serde_json::{Map, Value};

/// Trims surrounding whitespace and escapes `< > & " '`.
///
/// Every `&` is escaped, including one that already starts an entity, so text
/// is stored exactly as typed. Only text without those five characters comes
/// back unchanged from a second pass.
pub fn sanitize_string(input: &str) -> String {
    let trimmed = input.trim();
    let mut out = String::with_capacity(trimmed.len());

    for c in trimmed.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }

    out
}

/// Sanitizes every string leaf, recursing through objects and arrays.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(sanitize_record(map)),
        other => other,
    }
}

pub fn sanitize_record(record: Map<String, Value>) -> Map<String, Value> {
    record
        .into_iter()
        .map(|(key, value)| (key, sanitize_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_script_tags() {
        let out = sanitize_string("<script>alert(1)</script>");
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;"));
        assert_eq!(out, "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn escapes_quotes_and_trims() {
        assert_eq!(sanitize_string("  O'Brien \"Jr\"\n"), "O&#039;Brien &quot;Jr&quot;");
        assert_eq!(sanitize_string("Tom & Jerry"), "Tom &amp; Jerry");
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        let samples = [
            "plain text",
            "  padded  ",
            "Calle 10 # 4-32, apto 201",
            "ñandú 3",
            "",
        ];
        for sample in samples {
            let once = sanitize_string(sample);
            assert_eq!(sanitize_string(&once), once, "{:?}", sample);
        }
    }

    #[test]
    fn existing_entities_are_escaped_again() {
        assert_eq!(sanitize_string("AT&amp;T"), "AT&amp;amp;T");
        assert_eq!(sanitize_string("&lt;b&gt;"), "&amp;lt;b&amp;gt;");
        assert_eq!(sanitize_string("&&&"), "&amp;&amp;&amp;");
        assert_eq!(sanitize_string(&sanitize_string("<")), "&amp;lt;");
    }

    #[test]
    fn record_recursion_leaves_non_strings() {
        let record = json!({
            "nombre1": " <i>Ana</i> ",
            "genero_id": 2,
            "activo": true,
            "nota": null,
            "contacto": {"correo": "a@b.com ", "tags": ["<x>", 5]}
        });

        let out = sanitize_value(record);
        assert_eq!(
            out,
            json!({
                "nombre1": "&lt;i&gt;Ana&lt;/i&gt;",
                "genero_id": 2,
                "activo": true,
                "nota": null,
                "contacto": {"correo": "a@b.com", "tags": ["&lt;x&gt;", 5]}
            })
        );
    }
}
