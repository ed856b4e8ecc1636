//! Action affordances (spec.md section 4.2): an `ActionDescriptor` runs its
//! body as a detached `tokio` task and is tracked through an `Invocation`
//! record owned by the `ActionManager`.

pub mod context;
pub mod descriptor;
pub mod injection;
pub mod invocation;
pub mod log;
pub mod manager;

pub use context::{CancelSignal, InvocationContext};
pub use descriptor::{ActionDescriptor, AnyActionDescriptor, DEFAULT_RETENTION};
pub use injection::{BlobContext, InvocationId, InvocationLogger};
pub use invocation::{Invocation, Status};
pub use log::{InvocationLogLayer, LogRecord, LogSink};
pub use manager::ActionManager;
