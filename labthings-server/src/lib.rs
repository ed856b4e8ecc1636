pub mod app;
pub mod handlers;
pub mod state;

pub use app::build_router;
pub use state::AppState;
