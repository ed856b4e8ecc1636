use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{OnceLock, Weak};

use dashmap::DashMap;
use serde_json::Value;

use crate::action::descriptor::AnyActionDescriptor;
use crate::error::ConfigurationError;
use crate::property::AnyPropertyDescriptor;
use crate::server::ServerHandle;

/// The affordance table shared by every `Thing` implementation. A concrete
/// Thing embeds one of these and exposes it through [`Thing::core`]; the
/// struct itself never appears behind `dyn` so that `Thing::setup`/`teardown`
/// can keep using `impl Future` return types (see [`DynThing`] for the
/// object-safe wrapper used by the server).
pub struct ThingCore {
    name: String,
    title: Option<String>,
    description: Option<String>,
    properties: DashMap<String, Box<dyn AnyPropertyDescriptor>>,
    property_order: boxcar_order::OrderTracker,
    actions: DashMap<String, std::sync::Arc<dyn AnyActionDescriptor>>,
    action_order: boxcar_order::OrderTracker,
    data_values: DashMap<String, Value>,
    server: OnceLock<Weak<ServerHandle>>,
    settings_lock: tokio::sync::Mutex<()>,
}

/// `DashMap` doesn't remember insertion order; affordances should still list
/// in Thing Descriptions in the order they were declared, so each table
/// keeps a side vec of names. Small and self-contained enough not to need a
/// real crate for it.
mod boxcar_order {
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct OrderTracker(Mutex<Vec<String>>);

    impl OrderTracker {
        pub fn push(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_string());
        }

        pub fn names(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }
}

impl ThingCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            properties: DashMap::new(),
            property_order: Default::default(),
            actions: DashMap::new(),
            action_order: Default::default(),
            data_values: DashMap::new(),
            server: OnceLock::new(),
            settings_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// A Thing's path is derived from its name, per spec.md section 3:
    /// `/{name}/`.
    pub fn path(&self) -> String {
        format!("/{}/", self.name)
    }

    pub fn register_property(&self, descriptor: Box<dyn AnyPropertyDescriptor>) {
        self.property_order.push(descriptor.name());
        self.properties.insert(descriptor.name().to_string(), descriptor);
    }

    pub fn register_action(&self, descriptor: std::sync::Arc<dyn AnyActionDescriptor>) {
        self.action_order.push(descriptor.name());
        self.actions.insert(descriptor.name().to_string(), descriptor);
    }

    pub fn property(&self, name: &str) -> Option<dashmap::mapref::one::Ref<'_, String, Box<dyn AnyPropertyDescriptor>>> {
        self.properties.get(name)
    }

    /// Returns a cheap `Arc` clone rather than a `DashMap` guard, since
    /// invoking an action hands the descriptor off to a detached
    /// `tokio::spawn`'d task that must outlive this borrow.
    pub fn action(&self, name: &str) -> Option<std::sync::Arc<dyn AnyActionDescriptor>> {
        self.actions.get(name).map(|entry| entry.value().clone())
    }

    pub fn property_names(&self) -> Vec<String> {
        self.property_order.names()
    }

    pub fn action_names(&self) -> Vec<String> {
        self.action_order.names()
    }

    /// The backing store used by `DataProperty<T>`; functional properties
    /// never touch this.
    pub fn data_get(&self, name: &str, default: &Value) -> Value {
        self.data_values
            .get(name)
            .map(|v| v.clone())
            .unwrap_or_else(|| default.clone())
    }

    pub fn data_set(&self, name: &str, value: Value) {
        self.data_values.insert(name.to_string(), value);
    }

    /// Sets a data-backed property's value and publishes a `propertyStatus`
    /// update to any WebSocket subscribers, the same notification a
    /// successful HTTP `PUT` triggers (spec.md 4.1, 4.4). A Thing's own
    /// action/setup code should call this instead of [`Self::data_set`]
    /// whenever it changes a property's value on the Thing's behalf — e.g.
    /// `counter.increment` bumping `count` — so observers see the change
    /// without the write having gone through HTTP at all.
    pub fn set_property(&self, name: &str, value: Value) {
        self.data_set(name, value.clone());
        if let Some(server) = self.server() {
            if server.is_running() {
                server.observations.publish_property(&self.name, name, value);
            }
        }
    }

    pub fn bind_server(&self, server: Weak<ServerHandle>) {
        // Set once, at registration time; a second bind (e.g. re-adding a
        // Thing to a different server) is a programming error we surface
        // loudly rather than silently ignore.
        let _ = self.server.set(server);
    }

    pub fn server(&self) -> Option<std::sync::Arc<ServerHandle>> {
        self.server.get().and_then(Weak::upgrade)
    }

    /// Guards settings-file writes so two concurrent setting-property
    /// writes on the same Thing can't interleave their save-to-disk passes
    /// (spec.md 4.6).
    pub fn settings_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.settings_lock
    }
}

/// Implemented by user-defined lab instrument Things. Uses argument-position
/// `impl Future` so concrete Things read like ordinary async methods; the
/// object-safe [`DynThing`] wrapper (blanket-implemented below) is what the
/// server actually stores, since a running server holds a heterogeneous set
/// of Things.
pub trait Thing: Send + Sync + 'static {
    fn core(&self) -> &ThingCore;

    /// Runs once, after slots are resolved and settings are loaded, before
    /// the Thing starts serving requests. Override to acquire hardware
    /// handles, open serial ports, etc.
    fn setup(&self) -> impl Future<Output = Result<(), ConfigurationError>> + Send {
        async { Ok(()) }
    }

    /// Runs once at server shutdown, in the reverse of construction order
    /// across all Things. Errors are logged, not propagated — teardown must
    /// not prevent the rest of the server from shutting down cleanly.
    fn teardown(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Object-safe counterpart to [`Thing`], auto-implemented for every `T:
/// Thing`. The server and action manager hold `Arc<dyn DynThing>`; concrete
/// handlers downcast back to `T` via [`DynThing::as_any_arc`] when they need
/// the strongly-typed instance (action invocation, slot resolution).
pub trait DynThing: Send + Sync + 'static {
    fn core(&self) -> &ThingCore;

    fn setup_boxed(&self) -> Pin<Box<dyn Future<Output = Result<(), ConfigurationError>> + Send + '_>>;

    fn teardown_boxed(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_arc(self: std::sync::Arc<Self>) -> std::sync::Arc<dyn Any + Send + Sync>;
}

impl<T: Thing> DynThing for T {
    fn core(&self) -> &ThingCore {
        Thing::core(self)
    }

    fn setup_boxed(&self) -> Pin<Box<dyn Future<Output = Result<(), ConfigurationError>> + Send + '_>> {
        Box::pin(Thing::setup(self))
    }

    fn teardown_boxed(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(Thing::teardown(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_arc(self: std::sync::Arc<Self>) -> std::sync::Arc<dyn Any + Send + Sync> {
        self
    }
}
