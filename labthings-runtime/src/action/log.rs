use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::Event;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// One captured log line, attached to the invocation that was running when
/// it was emitted (spec.md 4.2: "invocations accumulate a log of messages
/// emitted while they run"; field set matches spec.md section 3's
/// `{message, level_name, level_no, line_no, filename, created, exception_type?,
/// traceback?}`, the shape `logging.LogRecord` takes in the source this
/// crate's Thing model was distilled from).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub message: String,
    pub level: String,
    pub level_no: u8,
    pub line_no: u32,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub exception_type: Option<String>,
    pub traceback: Option<String>,
}

/// Python's `logging` numeric levels, the closest analogue `level_no` has.
/// `tracing` has no `CRITICAL`; `TRACE` is finer than `DEBUG` so it is given
/// a number below it rather than reusing Python's scale exactly.
pub(crate) fn level_no(level: &tracing::Level) -> u8 {
    match *level {
        tracing::Level::ERROR => 40,
        tracing::Level::WARN => 30,
        tracing::Level::INFO => 20,
        tracing::Level::DEBUG => 10,
        tracing::Level::TRACE => 5,
    }
}

#[derive(Clone, Default)]
pub struct LogSink(Arc<Mutex<Vec<LogRecord>>>);

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: LogRecord) {
        self.0.lock().unwrap().push(record);
    }

    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

tokio::task_local! {
    static CURRENT_SINK: LogSink;
}

impl LogSink {
    /// Runs `f` with this sink installed as the current invocation's log
    /// destination. [`InvocationLogLayer`] forwards tracing events emitted
    /// anywhere in `f` (including spawned sub-tasks that re-enter the same
    /// task-local scope) into the sink.
    pub async fn scope<F: std::future::Future>(self, f: F) -> F::Output {
        CURRENT_SINK.scope(self, f).await
    }

    /// Pushes directly into whichever sink is ambient for the currently
    /// running invocation, if any. Used by [`super::injection::InvocationLogger`]
    /// so an action body can log explicitly rather than only through
    /// `tracing` events the layer happens to intercept.
    pub(crate) fn push_current(record: LogRecord) {
        let _ = CURRENT_SINK.try_with(|sink| sink.push(record));
    }
}

/// Captures the event's formatted message, plus the conventional `error = %e`
/// field (see e.g. `r2e-security::jwt`'s error-logging calls) as the closest
/// Rust analogue to an exception/traceback pair.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    error: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "error" => self.error = Some(format!("{value:?}")),
            _ => {}
        }
    }
}

/// A `tracing_subscriber` layer that appends every event emitted while a
/// [`LogSink`] is the ambient task-local sink into that invocation's log,
/// in the style of the teacher's request-scoped logging middleware.
pub struct InvocationLogLayer;

impl<S: tracing::Subscriber> Layer<S> for InvocationLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let _ = CURRENT_SINK.try_with(|sink| {
            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);
            let metadata = event.metadata();
            sink.push(LogRecord {
                message: visitor.message,
                level: metadata.level().to_string(),
                level_no: level_no(metadata.level()),
                line_no: metadata.line().unwrap_or(0),
                filename: metadata.file().unwrap_or("<unknown>").to_string(),
                timestamp: Utc::now(),
                exception_type: visitor.error.as_ref().map(|_| metadata.target().to_string()),
                traceback: visitor.error,
            });
        });
    }
}
