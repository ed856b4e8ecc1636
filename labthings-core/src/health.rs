//! A minimal liveness endpoint, additive to spec.md's endpoint table (not
//! one of its named affordance routes but grounded in the teacher's
//! `r2e_core::health` module, which every teacher app installs).

use crate::http::{Json, StatusCode};

#[derive(serde::Serialize)]
struct HealthBody {
    status: &'static str,
}

pub async fn health_handler() -> (StatusCode, Json<HealthBody>) {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}
