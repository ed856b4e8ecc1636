//! Thing Description assembly (spec.md section 4.8): renders a Thing's
//! registered properties and actions into a W3C WoT 1.1 Thing Description
//! document. `security` is always `"nosec"` — spec.md scopes
//! authentication out entirely, so there is exactly one security scheme.

use dashmap::DashMap;
use serde_json::{json, Map, Value};

use crate::thing::ThingCore;

/// Caches assembled Thing Descriptions by `(path, base_url)`, since the
/// affordance table a Thing Description is built from only changes when a
/// Thing is (re-)registered, never per-request.
#[derive(Default)]
pub struct TdCache {
    cache: DashMap<(String, String), Value>,
}

impl TdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, core: &ThingCore, base_url: &str) -> Value {
        let key = (core.path(), base_url.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        let td = build(core, base_url);
        self.cache.insert(key, td.clone());
        td
    }

    pub fn invalidate(&self, path: &str) {
        self.cache.retain(|(p, _), _| p != path);
    }
}

fn property_forms(base_url: &str, thing_path: &str, name: &str, readonly: bool) -> Value {
    let href = format!("{base_url}{thing_path}{name}");
    let ops: Value = if readonly {
        json!(["readproperty"])
    } else {
        json!(["readproperty", "writeproperty"])
    };
    json!([{ "href": href, "op": ops }])
}

fn action_forms(base_url: &str, thing_path: &str, name: &str) -> Value {
    let href = format!("{base_url}{thing_path}{name}");
    json!([{ "href": href, "op": ["invokeaction"] }])
}

/// Builds a Thing Description for `core` from scratch (no cache lookup);
/// [`TdCache::get_or_build`] is the entry point callers should normally use.
pub fn build(core: &ThingCore, base_url: &str) -> Value {
    let thing_path = core.path();

    let mut properties = Map::new();
    for name in core.property_names() {
        let Some(descriptor) = core.property(&name) else { continue };
        let mut schema = descriptor.schema();
        if let Value::Object(map) = &mut schema {
            map.insert("readOnly".into(), Value::Bool(descriptor.readonly()));
            map.insert("observable".into(), Value::Bool(descriptor.observable()));
            if let Some(title) = descriptor.title() {
                map.insert("title".into(), Value::String(title.to_string()));
            }
            if let Some(description) = descriptor.description() {
                map.insert("description".into(), Value::String(description.to_string()));
            }
            map.insert("forms".into(), property_forms(base_url, &thing_path, &name, descriptor.readonly()));
        }
        properties.insert(name, schema);
    }

    let mut actions = Map::new();
    for name in core.action_names() {
        let Some(descriptor) = core.action(&name) else { continue };
        let mut entry = json!({
            "input": descriptor.input_schema(),
            "output": descriptor.output_schema(),
            "forms": action_forms(base_url, &thing_path, &name),
        });
        if let Value::Object(map) = &mut entry {
            if let Some(title) = descriptor.title() {
                map.insert("title".into(), Value::String(title.to_string()));
            }
            if let Some(description) = descriptor.description() {
                map.insert("description".into(), Value::String(description.to_string()));
            }
        }
        actions.insert(name, entry);
    }

    json!({
        "@context": "https://www.w3.org/2022/wot/td/v1.1",
        "id": format!("urn:labthings:{}", core.name()),
        "title": core.title().unwrap_or_else(|| core.name()),
        "description": core.description(),
        "properties": properties,
        "actions": actions,
        "security": "nosec",
        "securityDefinitions": { "no_security": { "scheme": "nosec" } },
        "forms": [{ "href": format!("{base_url}{thing_path}"), "op": ["readallproperties"] }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::data_property;
    use crate::thing::Thing;
    use std::sync::Arc;

    struct Counter {
        core: ThingCore,
    }

    impl Thing for Counter {
        fn core(&self) -> &ThingCore {
            &self.core
        }
    }

    #[test]
    fn build_includes_registered_properties_with_forms() {
        let counter = Arc::new(Counter { core: ThingCore::new("counter") });
        let count = data_property::<Counter, i64>("count", 0, Arc::downgrade(&counter));
        counter.core.register_property(Box::new(count));

        let td = build(&counter.core, "http://localhost:5000");
        assert_eq!(td["properties"]["count"]["readOnly"], false);
        assert_eq!(
            td["properties"]["count"]["forms"][0]["href"],
            "http://localhost:5000/counter/count"
        );
        assert_eq!(td["security"], "nosec");
        assert_eq!(td["securityDefinitions"]["no_security"]["scheme"], "nosec");
    }

    #[test]
    fn cache_returns_the_same_document_until_invalidated() {
        let counter = Arc::new(Counter { core: ThingCore::new("counter") });
        let cache = TdCache::new();
        let first = cache.get_or_build(&counter.core, "http://localhost:5000");
        let second = cache.get_or_build(&counter.core, "http://localhost:5000");
        assert_eq!(first, second);

        cache.invalidate(&counter.core.path());
        assert_eq!(cache.cache.len(), 0);
    }
}
