//! Thin re-exports over Axum so the rest of the workspace depends on
//! `labthings_core::http` rather than `axum` directly — mirrors the
//! teacher's `r2e_core::http` wrapper module.

pub use axum::extract::{Path, Query, State};
pub use axum::http::{HeaderMap, StatusCode};
pub use axum::response::{IntoResponse, Redirect, Response};
pub use axum::routing::{delete, get, post, put};
pub use axum::{Json, Router};

pub mod ws {
    pub use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
}
