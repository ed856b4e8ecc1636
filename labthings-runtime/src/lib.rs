//! The LabThings affordance runtime: Things, properties, actions,
//! invocations, observation, slots, settings persistence, and the server
//! that ties them together (spec.md sections 3-5).

pub mod action;
pub mod blob;
pub mod error;
pub mod observation;
pub mod property;
pub mod server;
pub mod settings;
pub mod slot;
pub mod td;
pub mod thing;

pub mod prelude {
    pub use crate::action::{
        ActionDescriptor, ActionManager, AnyActionDescriptor, BlobContext, CancelSignal, InvocationContext,
        InvocationId, InvocationLogger, Status,
    };
    pub use crate::blob::{Blob, BlobRef, BlobRegistry};
    pub use crate::error::{ActionError, ConfigurationError};
    pub use crate::observation::ObservationBus;
    pub use crate::property::{data_property, functional_property, setting_property, AnyPropertyDescriptor, Constraints};
    pub use crate::server::{ServerBuilder, ServerConfig, ServerHandle};
    pub use crate::slot::{Candidate, OptionalSlot, Slot, SlotMap, ThingRef};
    pub use crate::thing::{DynThing, Thing, ThingCore};
}
