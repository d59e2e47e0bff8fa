//! TOML persistence for emitters
//!
//! An emitter file stores identity (name, id), the emitter's local
//! transform and the full configuration. Simulation state is never
//! persisted; a loaded engine starts from scratch and stays stopped
//! until the host plays it.

use crate::config::EmitterConfig;
use crate::engine::ParticleEngine;
use ember_core::{EmberError, EmitterId, Result, Transform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Bumped when the file layout changes incompatibly
pub const FORMAT_VERSION: u32 = 1;

/// On-disk representation of one emitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterFile {
    pub version: u32,
    pub name: String,
    pub id: EmitterId,
    #[serde(default)]
    pub transform: Transform,
    pub emitter: EmitterConfig,
}

impl EmitterFile {
    pub fn from_engine(engine: &ParticleEngine) -> Self {
        Self {
            version: FORMAT_VERSION,
            name: engine.name().to_string(),
            id: engine.id(),
            transform: engine.local_transform(),
            emitter: engine.config().clone(),
        }
    }

    /// Build an engine from this file. Validates the config, keeps the
    /// stored id and advances the global id counter past it so later
    /// `EmitterId::new()` calls cannot collide.
    pub fn into_engine(self) -> Result<ParticleEngine> {
        if self.version != FORMAT_VERSION {
            return Err(EmberError::ConfigError(format!(
                "unsupported emitter file version {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        EmitterId::ensure_counter_above(self.id.raw());
        ParticleEngine::restored(self.emitter, self.name, self.id, self.transform)
    }
}

/// Serialize an engine's persistent state to a TOML string
pub fn save_emitter_string(engine: &ParticleEngine) -> Result<String> {
    Ok(toml::to_string_pretty(&EmitterFile::from_engine(engine))?)
}

/// Write an engine's persistent state to `path`
pub fn save_emitter(engine: &ParticleEngine, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, save_emitter_string(engine)?)?;
    Ok(())
}

/// Parse a TOML string into a stopped, not-yet-started engine
pub fn load_emitter_string(text: &str) -> Result<ParticleEngine> {
    let file: EmitterFile = toml::from_str(text)?;
    file.into_engine()
}

/// Load an emitter file from disk
pub fn load_emitter(path: impl AsRef<Path>) -> Result<ParticleEngine> {
    let text = fs::read_to_string(path)?;
    load_emitter_string(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SimulationSpace, StopAction};
    use crate::curves::{ColorStop, CurvePoint, ScalarCurve};
    use crate::playback::PlaybackState;
    use ember_core::Vec3;

    fn sample_engine() -> ParticleEngine {
        let config = EmitterConfig {
            particle_count: 128,
            max_life: 2.5,
            burst: true,
            burst_count: 32,
            simulation_space: SimulationSpace::World,
            looping: false,
            stop_action: StopAction::Disable,
            play_on_awake: false,
            size_curve: Some(ScalarCurve::new(vec![
                CurvePoint { t: 0.0, value: 0.2 },
                CurvePoint { t: 1.0, value: 1.0 },
            ])),
            color_curve: Some(crate::curves::ColorCurve::new(vec![
                ColorStop { t: 0.0, r: 1.0, g: 0.5, b: 0.0, a: 1.0 },
                ColorStop { t: 1.0, r: 0.0, g: 0.0, b: 0.0, a: 0.0 },
            ])),
            ..Default::default()
        };
        let mut engine = ParticleEngine::with_name(config, "sparks").unwrap();
        engine.set_local_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        engine
    }

    #[test]
    fn engine_round_trips_through_toml() {
        let engine = sample_engine();
        let text = save_emitter_string(&engine).unwrap();
        let loaded = load_emitter_string(&text).unwrap();

        assert_eq!(loaded.name(), "sparks");
        assert_eq!(loaded.id(), engine.id());
        assert_eq!(loaded.config(), engine.config());
        let p = loaded.local_transform().position;
        assert!((p - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn loaded_engine_is_stopped_even_with_play_on_awake() {
        let config = EmitterConfig {
            particle_count: 16,
            play_on_awake: true,
            ..Default::default()
        };
        let engine = ParticleEngine::new(config).unwrap();
        let text = save_emitter_string(&engine).unwrap();
        let loaded = load_emitter_string(&text).unwrap();
        assert_eq!(loaded.state(), PlaybackState::Stopped);
        assert!(!loaded.has_started());
        assert_eq!(loaded.active_count(), 0);
    }

    #[test]
    fn loading_advances_the_id_counter() {
        let engine = sample_engine();
        let text = save_emitter_string(&engine).unwrap();
        let loaded = load_emitter_string(&text).unwrap();
        let fresh = ParticleEngine::new(EmitterConfig {
            particle_count: 8,
            play_on_awake: false,
            ..Default::default()
        })
        .unwrap();
        assert_ne!(fresh.id(), loaded.id());
        assert!(fresh.id().raw() > loaded.id().raw());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let engine = sample_engine();
        let mut file = EmitterFile::from_engine(&engine);
        file.version = 99;
        assert!(file.into_engine().is_err());
    }

    #[test]
    fn invalid_config_is_rejected_on_load() {
        let text = "version = 1\nname = \"bad\"\nid = 1\n\n[emitter]\nparticle_count = 0\n";
        assert!(load_emitter_string(text).is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let text = "version = 1\nname = \"minimal\"\nid = 3\n\n[emitter]\n";
        let engine = load_emitter_string(text).unwrap();
        assert_eq!(engine.config().particle_count, 10_000);
        assert!(engine.config().looping);
    }

    #[test]
    fn save_and_load_through_the_filesystem() {
        let engine = sample_engine();
        let path = std::env::temp_dir().join(format!("ember-emitter-{}.toml", engine.id().raw()));
        save_emitter(&engine, &path).unwrap();
        let loaded = load_emitter(&path).unwrap();
        assert_eq!(loaded.name(), engine.name());
        let _ = std::fs::remove_file(&path);
    }
}
