use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use super::log::{level_no, LogRecord, LogSink};

/// Just the invocation's id, for actions that only need it to build their
/// own links or correlate external state, without pulling in the rest of
/// `InvocationContext` (spec.md section 4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationId(pub Uuid);

/// A handle actions use to emit log lines into their own invocation's log,
/// the narrower surface `InvocationContext` exposes when a body only wants
/// to log and has no use for cancellation or blobs (grounded in the
/// Python source's per-invocation `logging.Logger`, which `invocations.py`
/// collects into the same `log` field this crate's `Invocation::log`
/// serializes).
#[derive(Clone, Copy, Default)]
pub struct InvocationLogger;

impl InvocationLogger {
    pub fn info(&self, message: impl Into<String>) {
        self.push(tracing::Level::INFO, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(tracing::Level::WARN, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(tracing::Level::ERROR, message.into());
    }

    fn push(&self, level: tracing::Level, message: String) {
        LogSink::push_current(LogRecord {
            message,
            level: level.to_string(),
            level_no: level_no(&level),
            line_no: 0,
            filename: String::new(),
            timestamp: Utc::now(),
            exception_type: None,
            traceback: None,
        });
    }
}

/// A handle actions use to register `Blob` outputs without needing the
/// whole `InvocationContext` (grounded in the original's narrower
/// `BlobIOContextDep`, the FastAPI dependency bodies that only produce
/// blobs receive instead of the full request context).
#[derive(Clone)]
pub struct BlobContext {
    pub(super) registry: Arc<crate::blob::BlobRegistry>,
    pub(super) produced: Arc<Mutex<Vec<Uuid>>>,
}

impl BlobContext {
    pub fn register(&self, blob: crate::blob::Blob) -> crate::blob::BlobRef {
        let blob_ref = self.registry.register(blob);
        if let Some(id) = blob_ref.href.strip_prefix("/blob/").and_then(|s| s.parse().ok()) {
            self.produced.lock().unwrap().push(id);
        }
        blob_ref
    }
}
