pub mod error;
pub mod health;
pub mod http;
pub mod layers;
pub mod params;
pub mod ws;

pub mod prelude {
    pub use crate::error::AppError;
    pub use crate::http::{IntoResponse, Json, Router, StatusCode};
    pub use crate::layers::{default_cors, default_trace, init_tracing};
    pub use crate::params::{parse_query_string, ParamError};
    pub use crate::ws::WsStream;
}
