//! Transforms a plain JSON Schema fragment (as derived by
//! [`crate::schema::json_schema_for`]) into a WoT Thing Description "Data
//! Schema" fragment, per spec.md section 4.7:
//!
//! - `anyOf` is emitted as `oneOf`.
//! - `prefixItems` (tuple validation) is emitted as an array-valued `items`.
//! - `additionalProperties` on an object is dropped (TD has no equivalent;
//!   spec.md allows "folded into properties or dropped" — we drop, since
//!   folding a boolean/schema additionalProperties into named properties has
//!   no general, lossless representation. See DESIGN.md Open Question OQ-2).
//! - Local `$ref`s are inlined, because the TD spec forbids external/internal
//!   references. Recursion is capped at depth 99 (spec.md 4.7); a schema that
//!   still contains a `$ref` at that depth is left as-is rather than looping
//!   forever — cyclic structural types are not expected from lab instrument
//!   affordances.

use serde_json::{Map, Value};

const MAX_INLINE_DEPTH: usize = 99;

/// Convert a schema produced by `schemars` (with its own `$defs` map) into a
/// standalone TD Data Schema with no external references.
pub fn to_data_schema(schema: Value) -> Value {
    let defs = extract_defs(&schema);
    let inlined = inline_refs(schema, &defs, 0);
    transform(inlined)
}

fn extract_defs(schema: &Value) -> Map<String, Value> {
    schema
        .get("$defs")
        .or_else(|| schema.get("definitions"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn inline_refs(value: Value, defs: &Map<String, Value>, depth: usize) -> Value {
    match value {
        Value::Object(mut map) => {
            map.remove("$defs");
            map.remove("definitions");

            if let Some(Value::String(r)) = map.get("$ref") {
                if depth < MAX_INLINE_DEPTH {
                    if let Some(name) = local_ref_name(r) {
                        if let Some(target) = defs.get(&name) {
                            return inline_refs(target.clone(), defs, depth + 1);
                        }
                    }
                }
                return Value::Object(map);
            }

            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k, inline_refs(v, defs, depth + 1));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| inline_refs(v, defs, depth + 1))
                .collect(),
        ),
        other => other,
    }
}

fn local_ref_name(r: &str) -> Option<String> {
    r.strip_prefix("#/$defs/")
        .or_else(|| r.strip_prefix("#/definitions/"))
        .map(str::to_string)
}

/// Apply the `anyOf`->`oneOf`, `prefixItems`->`items`, and
/// `additionalProperties`-dropping transforms, recursively.
fn transform(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, v) in map {
                let v = transform(v);
                match key.as_str() {
                    "anyOf" => {
                        out.insert("oneOf".to_string(), v);
                    }
                    "prefixItems" => {
                        // prefixItems is already an array of schemas; TD
                        // represents tuple validation as an array-valued
                        // `items`.
                        out.insert("items".to_string(), v);
                    }
                    "additionalProperties" => {
                        // dropped — see module docs.
                    }
                    _ => {
                        out.insert(key, v);
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(transform).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn any_of_becomes_one_of() {
        let schema = json!({"anyOf": [{"type": "integer"}, {"type": "null"}]});
        let td = to_data_schema(schema);
        assert!(td.get("oneOf").is_some());
        assert!(td.get("anyOf").is_none());
    }

    #[test]
    fn prefix_items_becomes_items_array() {
        let schema = json!({"prefixItems": [{"type": "string"}, {"type": "integer"}]});
        let td = to_data_schema(schema);
        assert_eq!(td["items"], json!([{"type": "string"}, {"type": "integer"}]));
    }

    #[test]
    fn additional_properties_is_dropped() {
        let schema = json!({"type": "object", "properties": {}, "additionalProperties": false});
        let td = to_data_schema(schema);
        assert!(td.get("additionalProperties").is_none());
        assert_eq!(td["type"], "object");
    }

    #[test]
    fn local_refs_are_inlined() {
        let schema = json!({
            "$ref": "#/$defs/Gain",
            "$defs": {"Gain": {"type": "number", "minimum": 0.0}},
        });
        let td = to_data_schema(schema);
        assert_eq!(td["type"], "number");
        assert_eq!(td["minimum"], 0.0);
        assert!(td.get("$ref").is_none());
    }

    #[test]
    fn nested_refs_inside_properties_are_inlined() {
        let schema = json!({
            "type": "object",
            "properties": {"gain": {"$ref": "#/$defs/Gain"}},
            "$defs": {"Gain": {"type": "number"}},
        });
        let td = to_data_schema(schema);
        assert_eq!(td["properties"]["gain"]["type"], "number");
    }
}
