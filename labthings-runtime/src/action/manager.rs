use std::sync::Arc;

use dashmap::DashMap;
use labthings_core::error::AppError;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::context::InvocationContext;
use super::descriptor::AnyActionDescriptor;
use super::invocation::{Invocation, Status};
use super::log::LogSink;
use crate::blob::BlobRegistry;
use crate::error::ActionError;
use crate::observation::ObservationBus;

/// Owns every in-flight and recently-terminated invocation across all
/// Things on a server, keyed by UUID (spec.md 4.2). One manager per
/// running server.
pub struct ActionManager {
    invocations: DashMap<Uuid, Arc<Mutex<Invocation>>>,
    blobs: Arc<BlobRegistry>,
    observations: Arc<ObservationBus>,
}

impl ActionManager {
    pub fn new(blobs: Arc<BlobRegistry>, observations: Arc<ObservationBus>) -> Arc<Self> {
        Arc::new(Self {
            invocations: DashMap::new(),
            blobs,
            observations,
        })
    }

    /// Creates the invocation record, starts the action body on a detached
    /// task, and returns immediately with the invocation id — actions are
    /// always asynchronous from the caller's point of view (spec.md 4.2).
    pub fn spawn(
        self: &Arc<Self>,
        descriptor: Arc<dyn AnyActionDescriptor>,
        thing_name: String,
        input: Value,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let action_name = descriptor.name().to_string();
        let invocation = Arc::new(Mutex::new(Invocation::new(
            id,
            thing_name.clone(),
            action_name.as_str(),
            input.clone(),
        )));
        self.invocations.insert(id, invocation.clone());

        let manager = Arc::clone(self);
        let blobs = Arc::clone(&self.blobs);
        tokio::spawn(async move {
            let cancel = invocation.lock().await.cancel.clone();
            let ctx = InvocationContext::with_cancel(id, cancel, blobs);
            {
                let mut guard = invocation.lock().await;
                guard.mark_running();
                manager.observations.publish_action(&thing_name, &action_name, guard.to_json());
            }

            let tracked_ctx = ctx.clone();
            let sink = LogSink::new();
            let result = sink
                .clone()
                .scope(ctx.clone().scope(descriptor.invoke(input, ctx)))
                .await;
            let produced_blobs = tracked_ctx.produced_blob_ids();

            {
                let mut guard = invocation.lock().await;
                for record in sink.drain() {
                    guard.push_log(record);
                }
                match result {
                    Ok(value) => guard.mark_completed(value),
                    Err(ActionError::Cancelled) => guard.mark_cancelled(),
                    Err(other) => guard.mark_error(other.to_string()),
                }
                manager.observations.publish_action(&thing_name, &action_name, guard.to_json());
            }

            tokio::time::sleep(descriptor.retention_time()).await;
            manager.invocations.remove(&id);
            for blob_id in produced_blobs {
                manager.blobs.invalidate(blob_id);
            }
        });

        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Value> {
        let invocation = self.invocations.get(&id)?.clone();
        let guard = invocation.lock().await;
        Some(guard.to_json())
    }

    pub async fn list(&self, thing_name: Option<&str>, action_name: Option<&str>) -> Vec<Value> {
        let mut out = Vec::new();
        for entry in self.invocations.iter() {
            let guard = entry.value().lock().await;
            let matches_thing = thing_name.map_or(true, |t| t == guard.thing_name);
            let matches_action = action_name.map_or(true, |a| a == guard.action_name);
            if matches_thing && matches_action {
                out.push(guard.to_json());
            }
        }
        out
    }

    /// Requests cancellation of a running invocation (`DELETE
    /// /action_invocations/{id}`). The invocation's body observes the
    /// request cooperatively via `CancelSignal::cancelled`; this call only
    /// flags the request and returns immediately.
    pub async fn request_cancel(&self, id: Uuid) -> Result<(), AppError> {
        let invocation = self
            .invocations
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("invocation '{id}'")))?
            .clone();
        let guard = invocation.lock().await;
        if guard.status() != Status::Running {
            return Err(AppError::ConflictOrUnavailable(format!(
                "invocation '{id}' is not running"
            )));
        }
        guard.cancel.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::descriptor::ActionDescriptor;
    use crate::thing::{Thing, ThingCore};
    use std::time::Duration;

    struct Dummy {
        core: ThingCore,
    }

    impl Thing for Dummy {
        fn core(&self) -> &ThingCore {
            &self.core
        }
    }

    #[tokio::test]
    async fn spawn_runs_to_completion_and_is_listed() {
        let manager = ActionManager::new(BlobRegistry::new(), Arc::new(ObservationBus::new()));
        let dummy = Arc::new(Dummy { core: ThingCore::new("dummy") });
        let descriptor: Arc<dyn AnyActionDescriptor> = Arc::new(ActionDescriptor::new(
            "echo",
            Arc::downgrade(&dummy),
            |_thing, input: i64, _ctx| async move { Ok::<i64, ActionError>(input * 2) },
        ));

        let id = manager.spawn(descriptor, "dummy".into(), Value::from(21));
        // give the spawned task a chance to run to completion.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let record = manager.get(id).await.unwrap();
        assert_eq!(record["status"], "completed");
        assert_eq!(record["output"], 42);

        let listed = manager.list(Some("dummy"), None).await;
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn cancel_request_is_observed_cooperatively() {
        let manager = ActionManager::new(BlobRegistry::new(), Arc::new(ObservationBus::new()));
        let dummy = Arc::new(Dummy { core: ThingCore::new("dummy") });
        let descriptor: Arc<dyn AnyActionDescriptor> = Arc::new(ActionDescriptor::new(
            "wait",
            Arc::downgrade(&dummy),
            |_thing, _input: (), ctx| async move {
                ctx.cancel.cancelled().await;
                Err::<(), ActionError>(ActionError::Cancelled)
            },
        ));

        let id = manager.spawn(descriptor, "dummy".into(), Value::Null);
        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.request_cancel(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let record = manager.get(id).await.unwrap();
        assert_eq!(record["status"], "cancelled");
    }

    #[tokio::test]
    async fn cancel_on_unknown_invocation_is_not_found() {
        let manager = ActionManager::new(BlobRegistry::new(), Arc::new(ObservationBus::new()));
        let err = manager.request_cancel(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn cancel_on_completed_invocation_is_unavailable() {
        let manager = ActionManager::new(BlobRegistry::new(), Arc::new(ObservationBus::new()));
        let dummy = Arc::new(Dummy { core: ThingCore::new("dummy") });
        let descriptor: Arc<dyn AnyActionDescriptor> = Arc::new(ActionDescriptor::new(
            "echo",
            Arc::downgrade(&dummy),
            |_thing, input: i64, _ctx| async move { Ok::<i64, ActionError>(input) },
        ));

        let id = manager.spawn(descriptor, "dummy".into(), Value::from(1));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = manager.request_cancel(id).await.unwrap_err();
        assert!(matches!(err, AppError::ConflictOrUnavailable(_)));
    }

    #[tokio::test]
    async fn blobs_produced_by_an_invocation_are_invalidated_on_expiry() {
        let blobs = BlobRegistry::new();
        let manager = ActionManager::new(blobs.clone(), Arc::new(ObservationBus::new()));
        let dummy = Arc::new(Dummy { core: ThingCore::new("dummy") });
        let descriptor: Arc<dyn AnyActionDescriptor> = Arc::new(
            ActionDescriptor::new(
                "snapshot",
                Arc::downgrade(&dummy),
                |_thing, _input: (), ctx| async move {
                    let blob_ref = ctx.register_blob(crate::blob::Blob::from_bytes("image/png", b"data".to_vec()));
                    Ok::<_, ActionError>(blob_ref)
                },
            )
            .retention_time(Duration::from_millis(10)),
        );

        let id = manager.spawn(descriptor, "dummy".into(), Value::Null);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let record = manager.get(id).await.unwrap();
        let href = record["output"]["href"].as_str().unwrap().to_string();
        let blob_id: Uuid = href.trim_start_matches("/blob/").parse().unwrap();
        assert!(blobs.get(blob_id).is_some());

        // past the 10ms retention window, the sweep should have invalidated it.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(blobs.get(blob_id).is_none());
        assert!(manager.get(id).await.is_none());
    }
}
