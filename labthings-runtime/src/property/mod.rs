//! Property affordances (spec.md section 4.1): `DataProperty<T>`,
//! `FunctionalProperty<T>`, and `SettingProperty<T>` are all built on top of
//! the single generic [`PropertyDescriptor`], which stores its read/write
//! behaviour as an [`Access`] enum rather than as three separate types. The
//! type aliases at the bottom of this module are what user code actually
//! names, matching the vocabulary of spec.md 4.1.

pub mod constraints;
mod data;
mod functional;
mod setting;

pub use constraints::Constraints;
pub use data::data_property;
pub use functional::functional_property;
pub use setting::setting_property;

use std::sync::{Arc, Weak};

use labthings_core::error::AppError;
use labthings_schema::{json_schema_for, to_data_schema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::thing::Thing;

type GetterFn<T, V> = Arc<dyn Fn(&T) -> V + Send + Sync>;
type SetterFn<T, V> = Arc<dyn Fn(&T, V) + Send + Sync>;

enum Access<T, V> {
    /// Value lives in the owning Thing's `ThingCore::data_values` map.
    Data,
    /// Value lives wherever the Thing's own getter/setter say it does
    /// (a hardware register, a derived computation, ...).
    Functional {
        getter: GetterFn<T, V>,
        setter: Option<SetterFn<T, V>>,
    },
}

/// A single property affordance, generic over its owning Thing type `T` and
/// Rust value type `V`. Type-erased to `dyn AnyPropertyDescriptor` for
/// storage in [`crate::thing::ThingCore`], since a Thing's property table
/// holds many different `V`s.
pub struct PropertyDescriptor<T, V> {
    name: String,
    title: Option<String>,
    description: Option<String>,
    constraints: Constraints,
    is_setting: bool,
    read_only: bool,
    access: Access<T, V>,
    default: V,
    thing: Weak<T>,
}

impl<T, V> PropertyDescriptor<T, V>
where
    T: Thing,
    V: Serialize + DeserializeOwned + schemars::JsonSchema + Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, default: V, access: Access<T, V>, thing: Weak<T>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            constraints: Constraints::new(),
            is_setting: false,
            read_only: false,
            access,
            default,
            thing,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Blocks HTTP `PUT` on a data property while leaving it writable from
    /// code inside the server (spec.md 4.1: "Read-only properties respond
    /// 405 to PUT"). A functional property with no setter is already
    /// read-only on its own; this flag exists for data properties whose
    /// value only the Thing itself should ever set (e.g. a counter).
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn mark_setting(mut self) -> Self {
        self.is_setting = true;
        self
    }

    fn upgrade(&self) -> Result<Arc<T>, AppError> {
        self.thing
            .upgrade()
            .ok_or_else(|| AppError::Internal(format!("thing for property '{}' has been dropped", self.name)))
    }
}

/// Object-safe interface the HTTP and observation layers actually call
/// through. Everything here deals in `serde_json::Value` so a `ThingCore`
/// can hold properties of heterogeneous `V` in one map.
pub trait AnyPropertyDescriptor: Send + Sync {
    fn name(&self) -> &str;
    fn title(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
    fn readonly(&self) -> bool;
    fn observable(&self) -> bool;
    fn is_setting(&self) -> bool;
    fn schema(&self) -> Value;
    fn read(&self) -> Result<Value, AppError>;
    /// `validate` is `false` when restoring persisted settings at startup
    /// (spec.md 4.6: unrecognised/invalid persisted values are ignored with
    /// a warning, not rejected outright).
    fn write(&self, value: Value, validate: bool) -> Result<Value, AppError>;
}

impl<T, V> AnyPropertyDescriptor for PropertyDescriptor<T, V>
where
    T: Thing,
    V: Serialize + DeserializeOwned + schemars::JsonSchema + Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn readonly(&self) -> bool {
        self.read_only || matches!(self.access, Access::Functional { setter: None, .. })
    }

    fn observable(&self) -> bool {
        // spec.md 4.1: every data property publishes propertyStatus on
        // write regardless of whether HTTP writes are blocked (read-only
        // data properties still change when the Thing itself writes them).
        // Functional properties without a setter never change from the
        // outside and have nothing to publish, so they can't be observed.
        match &self.access {
            Access::Data => true,
            Access::Functional { setter, .. } => setter.is_some(),
        }
    }

    fn is_setting(&self) -> bool {
        self.is_setting
    }

    fn schema(&self) -> Value {
        to_data_schema(json_schema_for::<V>())
    }

    fn read(&self) -> Result<Value, AppError> {
        let thing = self.upgrade()?;
        let value = match &self.access {
            Access::Data => {
                let default = serde_json::to_value(&self.default).map_err(|e| AppError::Internal(e.to_string()))?;
                thing.core().data_get(&self.name, &default)
            }
            Access::Functional { getter, .. } => {
                serde_json::to_value(getter(&thing)).map_err(|e| AppError::Internal(e.to_string()))?
            }
        };
        Ok(value)
    }

    fn write(&self, value: Value, validate: bool) -> Result<Value, AppError> {
        if validate {
            if self.readonly() {
                return Err(AppError::NotAllowed(format!("property '{}' is read-only", self.name)));
            }
            if let Err(errors) = self.constraints.validate(&value) {
                return Err(AppError::ValidationFailed(serde_json::json!(errors)));
            }
        }

        let thing = self.upgrade()?;
        match &self.access {
            Access::Data => {
                if validate {
                    serde_json::from_value::<V>(value.clone())
                        .map_err(|e| AppError::ValidationFailed(serde_json::json!([e.to_string()])))?;
                    // A real write (not a settings-file restore) notifies
                    // observers; restoring persisted settings at startup
                    // must not emit a change event (spec.md 4.6).
                    thing.core().set_property(&self.name, value.clone());
                } else {
                    thing.core().data_set(&self.name, value.clone());
                }
                Ok(value)
            }
            Access::Functional { setter: Some(setter), .. } => {
                let typed: V = serde_json::from_value(value.clone())
                    .map_err(|e| AppError::ValidationFailed(serde_json::json!([e.to_string()])))?;
                setter(&thing, typed);
                if validate {
                    if let Some(server) = thing.core().server() {
                        if server.is_running() {
                            server
                                .observations
                                .publish_property(thing.core().name(), &self.name, value.clone());
                        }
                    }
                }
                Ok(value)
            }
            Access::Functional { setter: None, .. } => {
                Err(AppError::NotAllowed(format!("property '{}' is read-only", self.name)))
            }
        }
    }
}
