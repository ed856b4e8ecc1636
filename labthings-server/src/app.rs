use labthings_core::http::{get, Router};
use labthings_core::{health, layers};

use crate::handlers::{action, blob, property, thing, ws};
use crate::state::AppState;

/// Wires up one `Router<AppState>` for every endpoint, with CORS/trace
/// layers applied once at the top and `/health` mounted alongside. A Thing's
/// properties and actions share a single path shape (`/{thing}/{affordance}`)
/// so the property and action routes for a given name are merged into one
/// route with per-method handlers rather than registered as two routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(thing::list_things))
        .route("/thing_descriptions/", get(thing::list_thing_descriptions))
        .route("/things/", get(thing::list_things))
        .route("/{thing_name}/", get(thing::get_thing_description))
        .route(
            "/{thing_name}/{affordance_name}",
            get(property::get_property)
                .put(property::put_property)
                .post(action::invoke_action),
        )
        .route("/action_invocations/", get(action::list_invocations))
        .route(
            "/action_invocations/{id}",
            get(action::get_invocation).delete(action::cancel_invocation),
        )
        .route("/action_invocations/{id}/output", get(action::get_invocation_output))
        .route("/blob/{id}", get(blob::get_blob))
        .route("/{thing_name}/ws", get(ws::thing_ws))
        .route("/health", get(health::health_handler))
        .layer(layers::default_trace())
        .layer(layers::default_cors())
        .with_state(state)
}
