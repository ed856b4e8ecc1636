//! Observation (spec.md section 4.4): subscribing to a property or action
//! affordance's status stream over the Thing's WebSocket.

pub mod bus;
pub mod message;

pub use bus::{ObservationBus, Subscriber};
pub use message::{action_status, error_message, property_status, ClientMessage, MessageType, Operation};
