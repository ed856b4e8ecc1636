use std::sync::Weak;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Access, PropertyDescriptor};
use crate::thing::Thing;

/// A persisted property: behaves like a [`super::data_property`] (runtime
/// stores the value) but is additionally written to and restored from the
/// Thing's settings file (spec.md 4.6). The settings loader distinguishes
/// these from plain data properties via [`super::AnyPropertyDescriptor::is_setting`].
pub fn setting_property<T, V>(name: impl Into<String>, default: V, thing: Weak<T>) -> PropertyDescriptor<T, V>
where
    T: Thing,
    V: Serialize + DeserializeOwned + schemars::JsonSchema + Clone + Send + Sync + 'static,
{
    PropertyDescriptor::new(name, default, Access::Data, thing).mark_setting()
}
