use std::sync::Arc;

use labthings_macros::Thing;
use labthings_runtime::action::InvocationContext;
use labthings_runtime::error::ActionError;
use labthings_runtime::property::{data_property, functional_property, setting_property, Constraints};
use labthings_runtime::server::{ServerBuilder, ServerConfig};
use labthings_runtime::slot::{resolve_one, Slot};
use labthings_runtime::thing::ThingCore;
use labthings_server::AppState;
use serde_json::Value;

/// A constrained temperature reading plus a persisted gain setting, used by
/// the property-validation and settings-persistence scenarios — `Counter`
/// itself has neither.
#[derive(Thing)]
pub struct Instrument {
    core: ThingCore,
}

impl Instrument {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let instrument = Arc::new(Self {
            core: ThingCore::new(name),
        });

        let temperature = data_property::<Instrument, f64>("temperature", 20.0, Arc::downgrade(&instrument))
            .title("Temperature")
            .description("Sample temperature in degrees Celsius")
            .constraints(Constraints::new().ge(-273.15).le(1000.0));
        instrument.core.register_property(Box::new(temperature));

        let gain = setting_property::<Instrument, f64>("gain", 1.0, Arc::downgrade(&instrument))
            .title("Gain");
        instrument.core.register_property(Box::new(gain));

        // A getter-only functional property: readonly and, per spec.md 4.1,
        // not observable either, since it never changes.
        let serial_number = functional_property::<Instrument, String>(
            "serial_number",
            String::new(),
            Arc::new(|_: &Instrument| "LT-0001".to_string()),
            None,
            Arc::downgrade(&instrument),
        )
        .title("Serial number");
        instrument.core.register_property(Box::new(serial_number));

        let wait = wait_descriptor(Arc::downgrade(&instrument));
        instrument.core.register_action(Arc::new(wait));

        instrument
    }
}

/// Waits for cancellation and never otherwise completes — the long-running
/// action the cancellation scenario needs.
#[labthings_macros::action]
async fn wait(_thing: Arc<Instrument>, ctx: InvocationContext) -> Result<(), ActionError> {
    ctx.cancel.cancelled().await;
    Err(ActionError::Cancelled)
}

/// `ThingB` depends on exactly one `ThingA` collaborator, resolved by type
/// during `setup` against the server's candidate table (spec.md 4.5).
#[derive(Thing)]
pub struct ThingA {
    core: ThingCore,
}

impl ThingA {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { core: ThingCore::new(name) })
    }

    pub fn say_hello(&self) -> String {
        format!("hello from {}", self.core.name())
    }
}

pub struct ThingB {
    core: ThingCore,
    other: Slot<ThingA>,
}

impl ThingB {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let thing = Arc::new(Self {
            core: ThingCore::new(name),
            other: Slot::new(),
        });

        let ask = ask_descriptor(Arc::downgrade(&thing));
        thing.core.register_action(Arc::new(ask));

        thing
    }
}

impl labthings_runtime::thing::Thing for ThingB {
    fn core(&self) -> &ThingCore {
        &self.core
    }

    async fn setup(&self) -> Result<(), labthings_runtime::error::ConfigurationError> {
        let candidates = self.core.server().expect("server bound before setup").candidates().to_vec();
        let a = resolve_one::<ThingA>(&candidates, None)?;
        self.other.resolve(a)
    }
}

#[labthings_macros::action]
async fn ask(thing: Arc<ThingB>, _ctx: InvocationContext) -> Result<String, ActionError> {
    Ok(thing.other.get().say_hello())
}

/// Builds a running server hosting a `Counter` and an `Instrument`, wired
/// into an `AppState` ready for `build_router`.
pub async fn counter_and_instrument_state(settings_folder: &std::path::Path) -> AppState {
    let config = ServerConfig {
        settings_folder: settings_folder.to_path_buf(),
        ..Default::default()
    };
    let server = ServerBuilder::new(config)
        .add_thing("counter", labthings_demo_counter::Counter::new("counter"))
        .add_thing("instrument", Instrument::new("instrument"))
        .build()
        .await
        .expect("server should build");

    AppState::new(server, "http://127.0.0.1:0")
}

#[allow(dead_code)]
pub fn as_i64(value: &Value) -> i64 {
    value.as_i64().expect("expected an integer JSON value")
}
