use labthings_core::error::AppError;
use labthings_core::http::{Json, Path, State, StatusCode};
use serde_json::Value;

use crate::state::AppState;

pub async fn get_property(
    State(state): State<AppState>,
    Path((thing_name, property_name)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let thing = state
        .server
        .thing(&thing_name)
        .ok_or_else(|| AppError::NotFound(format!("thing '{thing_name}'")))?;
    let value = {
        let descriptor = thing
            .core()
            .property(&property_name)
            .ok_or_else(|| AppError::NotFound(format!("property '{property_name}'")))?;
        descriptor.read()?
    };
    Ok(Json(value))
}

pub async fn put_property(
    State(state): State<AppState>,
    Path((thing_name, property_name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.server.require_running()?;
    let thing = state
        .server
        .thing(&thing_name)
        .ok_or_else(|| AppError::NotFound(format!("thing '{thing_name}'")))?;

    // `PropertyDescriptor::write` already publishes a `propertyStatus`
    // update on a validated write (spec.md 4.1, 4.4); this handler doesn't
    // need to publish again.
    let value = {
        let descriptor = thing
            .core()
            .property(&property_name)
            .ok_or_else(|| AppError::NotFound(format!("property '{property_name}'")))?;
        descriptor.write(body, true)?
    };

    Ok((StatusCode::CREATED, Json(value)))
}
