use dashmap::DashMap;
use serde_json::Value;

/// Registry of JSON Schema fragments keyed by the Rust type's schema name,
/// in the style of the teacher's `r2e_openapi::SchemaRegistry`.
///
/// Property and action descriptors register their value/input/output types
/// here once at construction; the Thing Description builder (section 4.8)
/// pulls fragments out of this registry rather than re-deriving schema on
/// every request.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, Value>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str, schema: Value) {
        self.schemas.insert(name.to_string(), schema);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.schemas.get(name).map(|v| v.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }
}

/// Types that can describe themselves as a JSON Schema fragment.
///
/// Implemented generically for every `T: schemars::JsonSchema` via
/// [`json_schema_for`]; the trait exists as a named seam so property and
/// action descriptors can be generic over "a type with a schema" without
/// binding to `schemars` at every call site.
pub trait SchemaProvider {
    fn schema_name() -> &'static str;
    fn json_schema() -> Value;
}

impl<T: schemars::JsonSchema> SchemaProvider for T {
    fn schema_name() -> &'static str {
        // schemars exposes a Cow<str>; the 'static bound on most generated
        // schemas lets this degrade to the type's short name when it isn't.
        std::any::type_name::<T>()
    }

    fn json_schema() -> Value {
        json_schema_for::<T>()
    }
}

/// Derive the raw JSON Schema for `T` via `schemars`, with local `$ref`s
/// already resolved against the generator's own definitions (but not yet
/// inlined — see [`crate::td::to_data_schema`] for TD-specific inlining).
pub fn json_schema_for<T: schemars::JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(&schema).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_round_trips() {
        let reg = SchemaRegistry::new();
        reg.register("Temperature", serde_json::json!({"type": "number"}));
        assert!(reg.contains("Temperature"));
        assert_eq!(reg.get("Temperature").unwrap()["type"], "number");
        assert!(reg.get("Missing").is_none());
    }

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct Sample {
        gain: f64,
    }

    #[test]
    fn json_schema_for_derives_object_schema() {
        let schema = json_schema_for::<Sample>();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["gain"].is_object());
    }
}
