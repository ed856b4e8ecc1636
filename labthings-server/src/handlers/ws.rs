use labthings_core::error::AppError;
use labthings_core::http::ws::{Message, WebSocket, WebSocketUpgrade};
use labthings_core::http::{Path, State};
use labthings_runtime::observation::{error_message, ClientMessage, Operation};

use crate::state::AppState;

/// Upgrades `{thing.path}ws` to a WebSocket and dispatches observation
/// subscriptions (spec.md 4.4). A connection may subscribe to any number of
/// properties/actions by sending further `observeproperty`/`observeaction`
/// messages; anything else closes the socket with an error frame first.
pub async fn thing_ws(
    State(state): State<AppState>,
    Path(thing_name): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<axum::response::Response, AppError> {
    state
        .server
        .thing(&thing_name)
        .ok_or_else(|| AppError::NotFound(format!("thing '{thing_name}'")))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, thing_name)))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, thing_name: String) {
    use tokio::sync::mpsc;

    let (forward_tx, mut forward_rx) = mpsc::unbounded_channel::<serde_json::Value>();
    // Keeps every subscription's `Arc<Subscriber>` alive for the life of the
    // connection; dropping them (when the socket closes) unsubscribes from
    // the bus automatically.
    let mut subscriptions = Vec::new();

    loop {
        tokio::select! {
            outgoing = forward_rx.recv() => {
                match outgoing {
                    Some(message) => {
                        if socket.send(Message::Text(message.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                let Some(Ok(message)) = incoming else { break };
                let Message::Text(text) = message else { continue };

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage { operation: Operation::Observeproperty { name }, .. }) => {
                        match property_observability(&state, &thing_name, &name) {
                            None => {
                                let _ = socket
                                    .send(Message::Text(error_message("NotFound", "unknown property").to_string().into()))
                                    .await;
                                continue;
                            }
                            Some(false) => {
                                let _ = socket
                                    .send(Message::Text(
                                        error_message("NotObservable", "property is not observable").to_string().into(),
                                    ))
                                    .await;
                                continue;
                            }
                            Some(true) => {}
                        }
                        subscribe(&state, &thing_name, &name, &forward_tx, &mut subscriptions);
                    }
                    Ok(ClientMessage { operation: Operation::Observeaction { name }, .. }) => {
                        if !thing_has_action(&state, &thing_name, &name) {
                            let _ = socket
                                .send(Message::Text(error_message("NotFound", "unknown action").to_string().into()))
                                .await;
                            continue;
                        }
                        subscribe(&state, &thing_name, &name, &forward_tx, &mut subscriptions);
                    }
                    Err(_) => {
                        let _ = socket
                            .send(Message::Text(error_message("BadMessage", "unrecognised messageType").to_string().into()))
                            .await;
                        break;
                    }
                }
            }
        }
    }
}

/// `None` when the property doesn't exist; `Some(observable)` when it does
/// (spec.md 4.1, 4.4: a functional property with no setter can't be
/// observed).
fn property_observability(state: &AppState, thing_name: &str, property_name: &str) -> Option<bool> {
    let thing = state.server.thing(thing_name)?;
    let descriptor = thing.core().property(property_name)?;
    Some(descriptor.observable())
}

fn thing_has_action(state: &AppState, thing_name: &str, action_name: &str) -> bool {
    state
        .server
        .thing(thing_name)
        .and_then(|thing| thing.core().action(action_name).map(|_| ()))
        .is_some()
}

fn subscribe(
    state: &AppState,
    thing_name: &str,
    affordance_name: &str,
    forward_tx: &tokio::sync::mpsc::UnboundedSender<serde_json::Value>,
    subscriptions: &mut Vec<std::sync::Arc<labthings_runtime::observation::bus::Subscriber>>,
) {
    let (subscriber, mut rx) = state.server.observations.subscribe(thing_name, affordance_name);
    subscriptions.push(subscriber);

    let forward_tx = forward_tx.clone();
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if forward_tx.send(message).is_err() {
                break;
            }
        }
    });
}
