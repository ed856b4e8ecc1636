use labthings_core::error::AppError;
use labthings_core::http::{HeaderMap, Json, Path, Query, State, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::state::AppState;

pub async fn invoke_action(
    State(state): State<AppState>,
    Path((thing_name, action_name)): Path<(String, String)>,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.server.require_running()?;
    let thing = state
        .server
        .thing(&thing_name)
        .ok_or_else(|| AppError::NotFound(format!("thing '{thing_name}'")))?;
    let descriptor = thing
        .core()
        .action(&action_name)
        .ok_or_else(|| AppError::NotFound(format!("action '{action_name}'")))?;

    let id = state.server.actions.spawn(descriptor, thing_name, input);
    let record = state.server.actions.get(id).await.unwrap_or(Value::Null);
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct ListInvocationsQuery {
    thing: Option<String>,
    action: Option<String>,
}

pub async fn list_invocations(
    State(state): State<AppState>,
    Query(query): Query<ListInvocationsQuery>,
) -> Json<Vec<Value>> {
    let records = state
        .server
        .actions
        .list(query.thing.as_deref(), query.action.as_deref())
        .await;
    Json(records)
}

pub async fn get_invocation(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Value>, AppError> {
    state
        .server
        .actions
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("invocation '{id}'")))
}

pub async fn cancel_invocation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.server.actions.request_cancel(id).await?;
    let record = state.server.actions.get(id).await.unwrap_or(Value::Null);
    Ok((StatusCode::OK, Json(record)))
}

pub async fn get_invocation_output(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(HeaderMap, Json<Value>), AppError> {
    let record = state
        .server
        .actions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("invocation '{id}'")))?;
    let output = record.get("output").cloned().unwrap_or(Value::Null);
    if output.is_null() {
        return Err(AppError::ConflictOrUnavailable(format!(
            "invocation '{id}' has no output yet"
        )));
    }
    let headers = HeaderMap::new();
    Ok((headers, Json(output)))
}
