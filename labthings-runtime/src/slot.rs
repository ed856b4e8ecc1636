use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::error::ConfigurationError;

/// A declared dependency on exactly one instance of `T`, resolved once
/// before `Thing::setup` runs (spec.md section 4.x, slots). Resolution
/// priority: an explicit name from server configuration, then a declared
/// default name, then an "Auto" search over every registered candidate of
/// type `T` — which must find exactly one or resolution fails eagerly.
pub struct Slot<T: ?Sized> {
    cell: OnceLock<Arc<T>>,
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self { cell: OnceLock::new() }
    }
}

impl<T: ?Sized + 'static> Slot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, value: Arc<T>) -> Result<(), ConfigurationError> {
        self.cell
            .set(value)
            .map_err(|_| ConfigurationError::Other("slot already resolved".into()))
    }

    /// Panics if called before resolution — slots are guaranteed resolved
    /// before `setup` runs, so a Thing's own code can treat this as
    /// infallible once it is past construction.
    pub fn get(&self) -> &Arc<T> {
        self.cell
            .get()
            .expect("slot accessed before resolution; resolve() must run before Thing::setup")
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// A dependency that may or may not be present: zero or one matching
/// instance, never an error for "zero", but still an error for "more than
/// one".
pub struct OptionalSlot<T: ?Sized> {
    cell: OnceLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Default for OptionalSlot<T> {
    fn default() -> Self {
        Self { cell: OnceLock::new() }
    }
}

impl<T: ?Sized + 'static> OptionalSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, value: Option<Arc<T>>) -> Result<(), ConfigurationError> {
        self.cell
            .set(value)
            .map_err(|_| ConfigurationError::Other("slot already resolved".into()))
    }

    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell
            .get()
            .expect("slot accessed before resolution; resolve() must run before Thing::setup")
            .as_ref()
    }
}

/// A name-keyed family of dependencies, for Things that take an arbitrary
/// number of same-typed collaborators (e.g. a multiplexer addressing many
/// sensors by name).
pub struct SlotMap<T: ?Sized> {
    cell: OnceLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> Default for SlotMap<T> {
    fn default() -> Self {
        Self { cell: OnceLock::new() }
    }
}

impl<T: ?Sized + 'static> SlotMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, value: HashMap<String, Arc<T>>) -> Result<(), ConfigurationError> {
        self.cell
            .set(value)
            .map_err(|_| ConfigurationError::Other("slot already resolved".into()))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.cell
            .get()
            .expect("slot accessed before resolution; resolve() must run before Thing::setup")
            .get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.cell
            .get()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// One registered candidate available for slot resolution: a named, typed
/// instance the server can hand out to any `Slot<T>`/`OptionalSlot<T>`/
/// `SlotMap<T>` that asks for type `T` by name or by "Auto" search.
/// Candidates are type-erased so the server's candidate table can hold
/// arbitrarily many unrelated types (spec.md: "circular deps permitted,
/// resolved by name not construction order").
#[derive(Clone)]
pub struct Candidate {
    pub name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl Candidate {
    pub fn new<T: Send + Sync + 'static>(name: impl Into<String>, value: Arc<T>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }
}

/// Resolves a `Slot<T>` against the candidate table: an explicit
/// `requested_name` wins if given, otherwise a unique type match is
/// required.
pub fn resolve_one<T: Send + Sync + 'static>(
    candidates: &[Candidate],
    requested_name: Option<&str>,
) -> Result<Arc<T>, ConfigurationError> {
    if let Some(name) = requested_name {
        let matching: Vec<_> = candidates.iter().filter(|c| c.name == name).collect();
        return match matching.as_slice() {
            [] => Err(ConfigurationError::SlotUnresolved(name.to_string())),
            [single] => single
                .downcast::<T>()
                .ok_or_else(|| ConfigurationError::SlotTypeMismatch(name.to_string())),
            _ => Err(ConfigurationError::SlotAmbiguous(name.to_string(), matching.len())),
        };
    }

    let typed: Vec<Arc<T>> = candidates.iter().filter_map(|c| c.downcast::<T>()).collect();
    match typed.as_slice() {
        [] => Err(ConfigurationError::SlotUnresolved("<auto>".to_string())),
        [single] => Ok(single.clone()),
        many => Err(ConfigurationError::SlotAmbiguous("<auto>".to_string(), many.len())),
    }
}

/// Direct in-process access to another registered Thing, given to an
/// action as a dependency-injected parameter (grounded in the original's
/// `DirectThingClient`: one Thing's action reaching another Thing's
/// properties and actions directly, with no HTTP round trip). An action
/// declares `other: ThingRef<Spectrometer>` and the macro adds a matching
/// `Weak<Spectrometer>` parameter to the generated `..._descriptor`
/// constructor, resolved the same way a `Slot<T>` is: against the
/// server's candidate table, before any Thing's `setup` runs.
#[derive(Clone)]
pub struct ThingRef<T: ?Sized>(Arc<T>);

impl<T: ?Sized> ThingRef<T> {
    pub fn new(value: Arc<T>) -> Self {
        Self(value)
    }
}

impl<T: ?Sized> std::ops::Deref for ThingRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}
