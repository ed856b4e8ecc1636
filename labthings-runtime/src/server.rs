use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use labthings_core::error::AppError;

use crate::action::ActionManager;
use crate::blob::BlobRegistry;
use crate::observation::ObservationBus;
use crate::slot::Candidate;
use crate::thing::{DynThing, Thing};

/// Plain configuration struct for the settings folder and defaults — no
/// file-based config parsing, per spec.md's Non-goals; a caller builds one
/// of these in code (or from its own CLI args) and hands it to
/// [`ServerBuilder::new`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub settings_folder: PathBuf,
    pub retention_time: std::time::Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            settings_folder: PathBuf::from("./settings"),
            retention_time: crate::action::DEFAULT_RETENTION,
        }
    }
}

/// The shared state every registered Thing holds a `Weak` reference to, so
/// a Thing can publish observation updates or mint invocation/blob URLs
/// without owning the server that hosts it (spec.md section 3, ownership:
/// "Things do not own their server").
pub struct ServerHandle {
    pub config: ServerConfig,
    pub actions: Arc<ActionManager>,
    pub blobs: Arc<BlobRegistry>,
    pub observations: Arc<ObservationBus>,
    things: DashMap<String, Arc<dyn DynThing>>,
    candidates: Vec<Candidate>,
    running: AtomicBool,
}

impl ServerHandle {
    pub fn thing(&self, name: &str) -> Option<Arc<dyn DynThing>> {
        self.things.get(name).map(|t| t.clone())
    }

    pub fn thing_names(&self) -> Vec<String> {
        self.things.iter().map(|e| e.key().clone()).collect()
    }

    /// Every registered Thing, recorded by name and concrete type at
    /// `add_thing` time, available to a Thing's own `setup` for resolving
    /// its `Slot<T>`/`OptionalSlot<T>`/`SlotMap<T>` fields against its
    /// collaborators (spec.md 4.5).
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Required before publishing any observation update: a Thing that
    /// tries to notify subscribers before the server's event loop is
    /// running gets `AppError::ServerNotRunning` rather than silently
    /// dropping the update (spec.md section 7).
    pub fn require_running(&self) -> Result<(), AppError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(AppError::ServerNotRunning("server is not yet running".into()))
        }
    }
}

/// Builds up the ordered name->Thing map before the server starts; once
/// `build()` runs, slot resolution and settings loading have already
/// happened for every registered Thing.
pub struct ServerBuilder {
    config: ServerConfig,
    things: Vec<(String, Arc<dyn DynThing>)>,
    candidates: Vec<Candidate>,
}

impl ServerBuilder {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            things: Vec::new(),
            candidates: Vec::new(),
        }
    }

    /// Registers a Thing under `name` and records it as a slot candidate
    /// under its concrete type `T`, so any other registered Thing's
    /// `Slot<T>` can resolve against it during `setup` (spec.md 4.5).
    pub fn add_thing<T: Thing>(mut self, name: impl Into<String>, thing: Arc<T>) -> Self {
        let name = name.into();
        self.candidates.push(Candidate::new(name.clone(), thing.clone()));
        self.things.push((name, thing as Arc<dyn DynThing>));
        self
    }

    /// Binds every Thing to the new server handle, loads persisted
    /// settings, and runs `Thing::setup` in registration order. If any
    /// Thing's setup fails, the ones that already succeeded are torn down
    /// in reverse before the error is returned — a partially-initialised
    /// server is never handed back to the caller.
    pub async fn build(self) -> Result<Arc<ServerHandle>, crate::error::ConfigurationError> {
        let blobs = BlobRegistry::new();
        let observations = Arc::new(ObservationBus::new());
        let handle = Arc::new(ServerHandle {
            actions: ActionManager::new(blobs.clone(), observations.clone()),
            blobs,
            observations,
            config: self.config,
            things: DashMap::new(),
            candidates: self.candidates,
            running: AtomicBool::new(false),
        });

        let mut initialised: Vec<Arc<dyn DynThing>> = Vec::new();
        for (name, thing) in self.things {
            thing.core().bind_server(Arc::downgrade(&handle));
            crate::settings::load(thing.core(), &handle.config.settings_folder).await;

            if let Err(e) = thing.setup_boxed().await {
                for done in initialised.iter().rev() {
                    done.teardown_boxed().await;
                }
                return Err(e);
            }

            handle.things.insert(name, thing.clone());
            initialised.push(thing);
        }

        handle.running.store(true, Ordering::SeqCst);
        Ok(handle)
    }
}

/// Stops the server: flips the running flag, tears down every Thing in the
/// reverse of its setup order, and saves final settings snapshots
/// (spec.md section 3, teardown). Teardown and save errors are logged, not
/// propagated — shutdown always completes.
pub async fn shutdown(handle: &Arc<ServerHandle>) {
    handle.running.store(false, Ordering::SeqCst);

    let mut things: Vec<_> = handle.things.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
    things.reverse();

    for (name, thing) in things {
        thing.teardown_boxed().await;
        if let Err(e) = crate::settings::save(thing.core(), &handle.config.settings_folder).await {
            tracing::warn!(thing = %name, error = %e, "failed to save settings during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;
    use crate::thing::{Thing, ThingCore};

    struct Plain {
        core: ThingCore,
    }

    impl Thing for Plain {
        fn core(&self) -> &ThingCore {
            &self.core
        }
    }

    struct Failing {
        core: ThingCore,
    }

    impl Thing for Failing {
        fn core(&self) -> &ThingCore {
            &self.core
        }

        async fn setup(&self) -> Result<(), ConfigurationError> {
            Err(ConfigurationError::Other("hardware not found".into()))
        }
    }

    #[tokio::test]
    async fn build_registers_things_and_marks_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            settings_folder: dir.path().to_path_buf(),
            ..Default::default()
        };
        let plain = Arc::new(Plain { core: ThingCore::new("plain") });
        let handle = ServerBuilder::new(config).add_thing("plain", plain).build().await.unwrap();

        assert!(handle.is_running());
        assert_eq!(handle.thing_names(), vec!["plain".to_string()]);
        assert!(handle.thing("plain").is_some());
    }

    #[tokio::test]
    async fn failed_setup_tears_down_earlier_things_and_returns_err() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            settings_folder: dir.path().to_path_buf(),
            ..Default::default()
        };
        let plain = Arc::new(Plain { core: ThingCore::new("plain") });
        let failing = Arc::new(Failing { core: ThingCore::new("failing") });

        let result = ServerBuilder::new(config)
            .add_thing("plain", plain)
            .add_thing("failing", failing)
            .build()
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn publishing_before_running_is_rejected() {
        let observations = Arc::new(ObservationBus::new());
        let handle = ServerHandle {
            config: ServerConfig::default(),
            actions: ActionManager::new(BlobRegistry::new(), observations.clone()),
            blobs: BlobRegistry::new(),
            observations,
            things: DashMap::new(),
            candidates: Vec::new(),
            running: AtomicBool::new(false),
        };
        assert!(matches!(handle.require_running(), Err(AppError::ServerNotRunning(_))));
    }
}
