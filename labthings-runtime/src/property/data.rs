use std::sync::Weak;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Access, PropertyDescriptor};
use crate::thing::Thing;

/// A property whose value is stored by the runtime itself (in
/// `ThingCore::data_values`) rather than computed from the Thing's own
/// state. Always read-write and always observable — spec.md 4.1.
pub fn data_property<T, V>(name: impl Into<String>, default: V, thing: Weak<T>) -> PropertyDescriptor<T, V>
where
    T: Thing,
    V: Serialize + DeserializeOwned + schemars::JsonSchema + Clone + Send + Sync + 'static,
{
    PropertyDescriptor::new(name, default, Access::Data, thing)
}
