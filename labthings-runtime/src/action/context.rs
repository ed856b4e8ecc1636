use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use uuid::Uuid;

use super::injection::{BlobContext, InvocationId, InvocationLogger};

/// Per-invocation cancellation, with "consult and clear" semantics: a single
/// `cancel()` call causes exactly one pending or future `cancelled()`/
/// `consult()` to observe the request, which clears it — a second consult
/// sees no cancellation until `cancel()` is called again. `tokio_util`'s
/// `CancellationToken` is one-shot and permanent once triggered, which
/// doesn't match spec.md 4.2's requirement that a cleared signal can be set
/// again for a later cooperative check point (see DESIGN.md OQ-1).
#[derive(Clone)]
pub struct CancelSignal(Arc<Inner>);

struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            requested: AtomicBool::new(false),
            notify: Notify::new(),
        }))
    }

    /// Requests cancellation. Wakes any task parked in `cancelled()`.
    pub fn cancel(&self) {
        self.0.requested.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    /// Atomically reads and clears the cancellation flag, returning whether
    /// it was set. Calling this is what "consumes" a cancellation request.
    pub fn consult(&self) -> bool {
        self.0.requested.swap(false, Ordering::SeqCst)
    }

    /// Non-consuming peek, for diagnostics/status reporting.
    pub fn is_requested(&self) -> bool {
        self.0.requested.load(Ordering::SeqCst)
    }

    /// Waits until a cancellation is requested, consuming it on return.
    pub async fn cancelled(&self) {
        loop {
            if self.consult() {
                return;
            }
            self.0.notify.notified().await;
        }
    }
}

/// The dependency-injected context available to a running action body,
/// exposed as an ordinary function parameter today (spec.md leaves the
/// macro-generated extraction mechanism open; see labthings-macros).
#[derive(Clone)]
pub struct InvocationContext {
    pub id: Uuid,
    pub cancel: CancelSignal,
    pub blobs: Arc<crate::blob::BlobRegistry>,
    produced_blobs: Arc<std::sync::Mutex<Vec<Uuid>>>,
}

impl InvocationContext {
    pub fn new(id: Uuid, blobs: Arc<crate::blob::BlobRegistry>) -> Self {
        Self::with_cancel(id, CancelSignal::new(), blobs)
    }

    pub(crate) fn with_cancel(id: Uuid, cancel: CancelSignal, blobs: Arc<crate::blob::BlobRegistry>) -> Self {
        Self {
            id,
            cancel,
            blobs,
            produced_blobs: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Registers a blob produced while this invocation runs, tracking its id
    /// so the action manager can invalidate it when the invocation expires
    /// (spec.md 3, Blob invariant: "invalidated when the parent Invocation
    /// expires"). Action bodies should call this rather than
    /// `self.blobs.register` directly.
    pub fn register_blob(&self, blob: crate::blob::Blob) -> crate::blob::BlobRef {
        self.blob_context().register(blob)
    }

    /// Just this invocation's id, for actions declaring an `InvocationId`
    /// parameter instead of the whole context.
    pub fn invocation_id(&self) -> InvocationId {
        InvocationId(self.id)
    }

    /// A narrower logging-only handle, for actions declaring an
    /// `InvocationLogger` parameter instead of the whole context.
    pub fn logger(&self) -> InvocationLogger {
        InvocationLogger
    }

    /// A narrower blob-registration handle, for actions declaring a
    /// `BlobContext` parameter instead of the whole context. Shares this
    /// context's produced-blob tracking, so blobs registered through it are
    /// still invalidated at the same retention sweep.
    pub fn blob_context(&self) -> BlobContext {
        BlobContext {
            registry: self.blobs.clone(),
            produced: self.produced_blobs.clone(),
        }
    }

    pub(crate) fn produced_blob_ids(&self) -> Vec<Uuid> {
        self.produced_blobs.lock().unwrap().clone()
    }
}

tokio::task_local! {
    /// Set for the lifetime of a running action invocation via
    /// `InvocationContext::scope`; lets nested async calls recover the
    /// ambient context without threading it through every signature.
    /// "Innermost wins" per spec.md section 9: a nested invocation (an
    /// action that itself calls another action) sees its own context while
    /// running, with the outer context restored once it returns.
    pub static CURRENT_CONTEXT: InvocationContext;
}

impl InvocationContext {
    pub async fn scope<F: std::future::Future>(self, f: F) -> F::Output {
        CURRENT_CONTEXT.scope(self, f).await
    }

    pub fn current() -> Option<InvocationContext> {
        CURRENT_CONTEXT.try_with(|ctx| ctx.clone()).ok()
    }
}
