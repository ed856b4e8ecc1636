use std::sync::Arc;

use labthings_macros::Thing;
use labthings_runtime::action::InvocationContext;
use labthings_runtime::error::ActionError;
use labthings_runtime::property::data_property;
use labthings_runtime::thing::{Thing as _, ThingCore};
use serde_json::Value;

/// A counter instrument (spec.md section 8, scenario 1): `count` starts at
/// zero and only ever moves through the `increment` action, never through
/// an HTTP `PUT`.
#[derive(Thing)]
pub struct Counter {
    core: ThingCore,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let counter = Arc::new(Self {
            core: ThingCore::new(name),
        });

        let count = data_property::<Counter, i64>("count", 0, Arc::downgrade(&counter))
            .title("Count")
            .description("Number of times increment has been invoked")
            .read_only();
        counter.core.register_property(Box::new(count));

        let increment = increment_descriptor(Arc::downgrade(&counter));
        counter.core.register_action(Arc::new(increment));

        counter
    }
}

#[labthings_macros::action]
async fn increment(thing: Arc<Counter>, _ctx: InvocationContext) -> Result<i64, ActionError> {
    let current = thing.core().data_get("count", &Value::from(0i64));
    let next = current.as_i64().unwrap_or(0) + 1;
    thing.core().set_property("count", Value::from(next));
    Ok(next)
}
