use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Access, PropertyDescriptor};
use crate::thing::Thing;

/// A property backed by the Thing's own getter (and optional setter) rather
/// than by runtime-managed storage — e.g. a temperature reading pulled off
/// a hardware register. `default` is only used for schema/documentation
/// purposes; `setter: None` makes the property read-only and un-observable
/// (spec.md 4.1).
pub fn functional_property<T, V>(
    name: impl Into<String>,
    default: V,
    getter: Arc<dyn Fn(&T) -> V + Send + Sync>,
    setter: Option<Arc<dyn Fn(&T, V) + Send + Sync>>,
    thing: Weak<T>,
) -> PropertyDescriptor<T, V>
where
    T: Thing,
    V: Serialize + DeserializeOwned + schemars::JsonSchema + Clone + Send + Sync + 'static,
{
    PropertyDescriptor::new(name, default, Access::Functional { getter, setter }, thing)
}
