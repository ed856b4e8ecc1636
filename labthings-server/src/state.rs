use std::sync::Arc;

use labthings_runtime::server::ServerHandle;
use labthings_runtime::td::TdCache;

/// Shared state every handler sees via `State<AppState>`, in the style of
/// the teacher's `r2e_core::State` pattern. Cheap to clone: everything
/// inside is already an `Arc` or a small owned string.
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<ServerHandle>,
    pub td_cache: Arc<TdCache>,
    pub base_url: String,
}

impl AppState {
    pub fn new(server: Arc<ServerHandle>, base_url: impl Into<String>) -> Self {
        Self {
            server,
            td_cache: Arc::new(TdCache::new()),
            base_url: base_url.into(),
        }
    }
}
