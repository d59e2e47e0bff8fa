//! Emitter configuration: named, typed fields with documented defaults

use crate::curves::{ColorCurve, ScalarCurve};
use ember_core::{Color, EmberError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coordinate frame in which particle motion is integrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationSpace {
    /// Particles move in the emitter's frame and follow it
    Local,
    /// Particles integrate in world coordinates and visually detach
    /// from a moving emitter
    World,
}

impl FromStr for SimulationSpace {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Local" => Ok(Self::Local),
            "World" => Ok(Self::World),
            other => Err(EmberError::InvalidEnumValue {
                value: other.to_string(),
                allowed: vec!["Local".to_string(), "World".to_string()],
            }),
        }
    }
}

/// Policy applied once emission has finished and the pool has drained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopAction {
    /// Keep the engine playing with zero visible particles
    #[default]
    None,
    /// Transition to the stopped state
    Disable,
    /// Clear the pool and ask the host to remove the emitter
    Destroy,
}

impl FromStr for StopAction {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "None" => Ok(Self::None),
            "Disable" => Ok(Self::Disable),
            "Destroy" => Ok(Self::Destroy),
            other => Err(EmberError::InvalidEnumValue {
                value: other.to_string(),
                allowed: vec![
                    "None".to_string(),
                    "Disable".to_string(),
                    "Destroy".to_string(),
                ],
            }),
        }
    }
}

/// Full emitter configuration.
///
/// Read as an immutable snapshot each tick; mutated between ticks
/// through the engine's setters, which validate at the boundary so the
/// pool can never be corrupted by a bad value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Pool capacity. Changing it destroys and reallocates the pool.
    pub particle_count: usize,
    /// Lifetime of each particle in seconds
    pub max_life: f32,
    /// Base spawn speed in units/second
    pub start_speed: f32,
    /// Uniform random speed added on top of `start_speed`
    pub speed_variation: f32,
    /// Continuous emission rate in particles/second
    pub emission_rate: f32,
    /// Emission cone full angle in radians around the emitter's up axis
    pub spread: f32,
    /// Gravitational acceleration along the vertical axis
    pub gravity: f32,
    /// Base particle size
    pub size: f32,
    /// Base particle color
    pub color: Color,
    /// Base opacity in [0, 1]
    pub opacity: f32,
    /// Emit a single batch per emission window instead of a continuous rate
    pub burst: bool,
    /// Batch size when `burst` is set
    pub burst_count: u32,
    /// Coordinate frame for integration
    pub simulation_space: SimulationSpace,
    /// Restart the emission window when `duration` elapses
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Length of one emission window in seconds
    pub duration: f32,
    /// What to do once emission is finished and no particles remain
    pub stop_action: StopAction,
    /// Begin playing as soon as the engine is created
    pub play_on_awake: bool,
    /// Simulate one full particle lifecycle on the first play
    pub prewarm: bool,
    /// Size-over-life curve; multiplies the base size when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_curve: Option<ScalarCurve>,
    /// Color-over-life stop list; overrides the default fade when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_curve: Option<ColorCurve>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            max_life: 3.0,
            start_speed: 5.0,
            speed_variation: 5.0,
            emission_rate: 100.0,
            spread: std::f32::consts::FRAC_PI_6,
            gravity: -9.8,
            size: 1.0,
            color: Color::from_hex(0x66CCFF),
            opacity: 0.8,
            burst: false,
            burst_count: 1000,
            simulation_space: SimulationSpace::Local,
            looping: true,
            duration: 5.0,
            stop_action: StopAction::None,
            play_on_awake: true,
            prewarm: false,
            size_curve: None,
            color_curve: None,
        }
    }
}

impl EmitterConfig {
    /// Check the invariants the engine relies on. Called once at
    /// configure time; individual setters re-check their own field.
    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 {
            return Err(EmberError::ValueOutOfRange {
                field: "particle_count".to_string(),
                min: 1.0,
                max: usize::MAX as f64,
                value: 0.0,
            });
        }
        check_positive("max_life", self.max_life)?;
        check_positive("duration", self.duration)?;
        check_finite("start_speed", self.start_speed)?;
        check_finite("speed_variation", self.speed_variation)?;
        check_finite("gravity", self.gravity)?;
        check_finite("spread", self.spread)?;
        check_non_negative("emission_rate", self.emission_rate)?;
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(EmberError::ValueOutOfRange {
                field: "opacity".to_string(),
                min: 0.0,
                max: 1.0,
                value: self.opacity as f64,
            });
        }
        Ok(())
    }

    /// Rebuild curve evaluators from their stored control points.
    ///
    /// Deserialized or hand-edited curves may arrive unsorted; the
    /// evaluators assume sorted input, so re-derive them on load.
    pub fn normalize_curves(&mut self) {
        if let Some(curve) = self.size_curve.take() {
            self.size_curve = Some(curve.rebuilt());
        }
        if let Some(curve) = self.color_curve.take() {
            self.color_curve = Some(curve.rebuilt());
        }
    }
}

pub(crate) fn check_positive(field: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EmberError::ValueOutOfRange {
            field: field.to_string(),
            min: f64::MIN_POSITIVE,
            max: f64::INFINITY,
            value: value as f64,
        });
    }
    Ok(())
}

pub(crate) fn check_finite(field: &str, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(EmberError::ValueOutOfRange {
            field: field.to_string(),
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            value: value as f64,
        });
    }
    Ok(())
}

pub(crate) fn check_non_negative(field: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EmberError::ValueOutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: f64::INFINITY,
            value: value as f64,
        });
    }
    Ok(())
}
