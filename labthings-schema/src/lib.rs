pub mod schema;
pub mod td;

pub use schema::{json_schema_for, SchemaProvider, SchemaRegistry};
pub use schemars;
pub use td::to_data_schema;
