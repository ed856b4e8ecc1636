use labthings_core::error::AppError;
use labthings_core::http::{Json, Path, State};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn list_things(State(state): State<AppState>) -> Json<Vec<Value>> {
    let items = state
        .server
        .thing_names()
        .into_iter()
        .map(|name| {
            let href = format!("{}/{}/", state.base_url, name);
            json!({ "name": name, "href": href })
        })
        .collect();
    Json(items)
}

pub async fn list_thing_descriptions(State(state): State<AppState>) -> Json<Vec<Value>> {
    let tds = state
        .server
        .thing_names()
        .into_iter()
        .filter_map(|name| state.server.thing(&name))
        .map(|thing| state.td_cache.get_or_build(thing.core(), &state.base_url))
        .collect();
    Json(tds)
}

pub async fn get_thing_description(
    State(state): State<AppState>,
    Path(thing_name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let thing = state
        .server
        .thing(&thing_name)
        .ok_or_else(|| AppError::NotFound(format!("thing '{thing_name}'")))?;
    Ok(Json(state.td_cache.get_or_build(thing.core(), &state.base_url)))
}
