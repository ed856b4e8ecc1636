//! LabThings — a single dependency re-exporting the whole framework:
//! `labthings-core` (HTTP plumbing), `labthings-schema` (JSON Schema/Thing
//! Description assembly), `labthings-runtime` (Things, properties, actions,
//! observation, blobs, settings, the server), `labthings-server` (the Axum
//! transport), and the `labthings-macros` derive/attribute macros.
//!
//! ```ignore
//! use labthings::prelude::*;
//! ```

pub extern crate labthings_core;
pub extern crate labthings_macros;
pub extern crate labthings_runtime;
pub extern crate labthings_schema;
pub extern crate labthings_server;

pub use labthings_macros::{action, Thing};
pub use labthings_runtime::thing::{DynThing, Thing as ThingTrait, ThingCore};

/// Import everything a lab-instrument crate typically needs to define and
/// serve Things.
pub mod prelude {
    pub use labthings_core::error::AppError;
    pub use labthings_macros::{action, Thing};
    pub use labthings_runtime::action::{ActionDescriptor, ActionManager, InvocationContext};
    pub use labthings_runtime::blob::{Blob, BlobRef, BlobRegistry};
    pub use labthings_runtime::error::{ActionError, ConfigurationError};
    pub use labthings_runtime::property::{data_property, functional_property, setting_property};
    pub use labthings_runtime::server::{ServerBuilder, ServerConfig, ServerHandle};
    pub use labthings_runtime::slot::{resolve_one, Candidate, OptionalSlot, Slot, SlotMap};
    pub use labthings_runtime::thing::{DynThing, Thing as ThingTrait, ThingCore};
    pub use labthings_server::{build_router, AppState};
}
