use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::thing::ThingCore;

fn settings_path(folder: &Path, thing_name: &str) -> PathBuf {
    folder.join(thing_name).join("settings.json")
}

/// Loads `{settings_folder}/{thing.name}/settings.json` and writes each
/// recognised key into the matching `SettingProperty` (spec.md 4.6). A
/// missing file is not an error — every Thing starts with defaults the
/// first time it runs. A malformed file, or a key that fails validation or
/// doesn't name a setting property, is logged and skipped rather than
/// aborting startup.
pub async fn load(core: &ThingCore, folder: &Path) {
    let path = settings_path(folder, core.name());
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            tracing::warn!(thing = core.name(), error = %e, "failed to read settings file, using defaults");
            return;
        }
    };

    let parsed: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(thing = core.name(), error = %e, "malformed settings file, using defaults");
            return;
        }
    };

    let Some(object) = parsed.as_object() else {
        tracing::warn!(thing = core.name(), "settings file is not a JSON object, using defaults");
        return;
    };

    for name in core.property_names() {
        let Some(value) = object.get(&name) else { continue };
        let Some(descriptor) = core.property(&name) else { continue };
        if !descriptor.is_setting() {
            continue;
        }
        if let Err(e) = descriptor.write(value.clone(), false) {
            tracing::warn!(thing = core.name(), property = %name, error = %e, "ignoring invalid persisted setting");
        }
    }
}

/// Snapshots every `SettingProperty` on `core` and writes it to the
/// settings file via write-to-temp-then-rename, so a crash mid-write never
/// leaves a half-written file behind.
pub async fn save(core: &ThingCore, folder: &Path) -> std::io::Result<()> {
    let _guard = core.settings_lock().lock().await;

    let mut snapshot = serde_json::Map::new();
    for name in core.property_names() {
        if let Some(descriptor) = core.property(&name) {
            if descriptor.is_setting() {
                if let Ok(value) = descriptor.read() {
                    snapshot.insert(name, value);
                }
            }
        }
    }

    let dir = folder.join(core.name());
    tokio::fs::create_dir_all(&dir).await?;
    let final_path = dir.join("settings.json");
    let tmp_path = dir.join("settings.json.tmp");
    let bytes = serde_json::to_vec_pretty(&Value::Object(snapshot))?;
    tokio::fs::write(&tmp_path, &bytes).await?;
    tokio::fs::rename(&tmp_path, &final_path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::setting_property;
    use crate::thing::Thing;
    use std::sync::Arc;

    struct Instrument {
        core: ThingCore,
    }

    impl Thing for Instrument {
        fn core(&self) -> &ThingCore {
            &self.core
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips_a_setting() {
        let dir = tempfile::tempdir().unwrap();
        let instrument = Arc::new(Instrument {
            core: ThingCore::new("spectrometer"),
        });
        let gain = setting_property::<Instrument, f64>("gain", 1.0, Arc::downgrade(&instrument));
        instrument.core.register_property(Box::new(gain));
        instrument.core.property("gain").unwrap().write(Value::from(2.5), true).unwrap();

        save(&instrument.core, dir.path()).await.unwrap();

        let reloaded = Arc::new(Instrument {
            core: ThingCore::new("spectrometer"),
        });
        let gain2 = setting_property::<Instrument, f64>("gain", 1.0, Arc::downgrade(&reloaded));
        reloaded.core.register_property(Box::new(gain2));
        load(&reloaded.core, dir.path()).await;

        assert_eq!(reloaded.core.property("gain").unwrap().read().unwrap(), Value::from(2.5));
    }

    #[tokio::test]
    async fn missing_settings_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let instrument = Arc::new(Instrument {
            core: ThingCore::new("spectrometer"),
        });
        let gain = setting_property::<Instrument, f64>("gain", 1.0, Arc::downgrade(&instrument));
        instrument.core.register_property(Box::new(gain));

        load(&instrument.core, dir.path()).await;

        assert_eq!(instrument.core.property("gain").unwrap().read().unwrap(), Value::from(1.0));
    }

    #[tokio::test]
    async fn malformed_settings_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let thing_dir = dir.path().join("spectrometer");
        tokio::fs::create_dir_all(&thing_dir).await.unwrap();
        tokio::fs::write(thing_dir.join("settings.json"), b"not json").await.unwrap();

        let instrument = Arc::new(Instrument {
            core: ThingCore::new("spectrometer"),
        });
        let gain = setting_property::<Instrument, f64>("gain", 1.0, Arc::downgrade(&instrument));
        instrument.core.register_property(Box::new(gain));

        load(&instrument.core, dir.path()).await;

        assert_eq!(instrument.core.property("gain").unwrap().read().unwrap(), Value::from(1.0));
    }
}
