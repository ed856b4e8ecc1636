use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;

use super::message::{action_status, property_status};

/// One WebSocket connection's registration on an affordance. Held strongly
/// by the connection task and weakly by the bus, so a dropped connection
/// disappears from the bus on its own — no explicit unsubscribe protocol
/// needed (spec.md 4.4).
pub struct Subscriber {
    sender: mpsc::UnboundedSender<Value>,
}

impl Subscriber {
    fn send(&self, message: Value) -> bool {
        self.sender.send(message).is_ok()
    }
}

#[derive(Eq, PartialEq, Hash, Clone)]
struct Key {
    thing_name: String,
    affordance_name: String,
}

/// Publish/subscribe hub for property and action observation, keyed by
/// `(thing_name, affordance_name)` (spec.md 4.4). One bus per running
/// server, shared by every Thing.
#[derive(Default)]
pub struct ObservationBus {
    subscribers: DashMap<Key, Vec<Weak<Subscriber>>>,
}

impl ObservationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns the receiving half of its
    /// channel. The caller (the WS connection handler) must keep the
    /// returned `Arc<Subscriber>` alive for as long as it wants messages;
    /// dropping it unsubscribes.
    pub fn subscribe(&self, thing_name: &str, affordance_name: &str) -> (Arc<Subscriber>, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Arc::new(Subscriber { sender: tx });
        let key = Key {
            thing_name: thing_name.to_string(),
            affordance_name: affordance_name.to_string(),
        };
        self.subscribers.entry(key).or_default().push(Arc::downgrade(&subscriber));
        (subscriber, rx)
    }

    pub fn publish_property(&self, thing_name: &str, property_name: &str, value: Value) {
        self.publish(thing_name, property_name, property_status(property_name, value));
    }

    pub fn publish_action(&self, thing_name: &str, action_name: &str, invocation: Value) {
        self.publish(thing_name, action_name, action_status(action_name, invocation));
    }

    fn publish(&self, thing_name: &str, affordance_name: &str, message: Value) {
        let key = Key {
            thing_name: thing_name.to_string(),
            affordance_name: affordance_name.to_string(),
        };
        if let Some(mut entry) = self.subscribers.get_mut(&key) {
            entry.retain(|weak| match weak.upgrade() {
                Some(subscriber) => {
                    subscriber.send(message.clone());
                    true
                }
                None => false,
            });
        }
    }
}
