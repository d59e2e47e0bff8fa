//! Ember Particles - pooled particle simulation engine
//!
//! Provides a host-driven, single-emitter particle simulation with:
//! - Fixed-capacity SoA pool with an active/inactive index partition
//! - Playback state machine (stopped/playing/paused) with looping,
//!   bursts and duration-based emission completion
//! - Local- or world-space kinematics with runtime space switching
//! - Size- and color-over-life curve evaluation
//! - Parallel position/color/size/alpha output buffers for verbatim
//!   GPU upload
//!
//! The host calls [`ParticleEngine::new`] once and [`ParticleEngine::tick`]
//! every frame; everything else is driven through the control interface.

pub mod buffers;
pub mod config;
pub mod curves;
pub mod engine;
pub mod hooks;
pub mod persist;
pub mod playback;
pub mod pool;
pub mod rand;
pub mod space;

pub use buffers::OutputBuffers;
pub use config::{EmitterConfig, SimulationSpace, StopAction};
pub use curves::{ColorCurve, ColorStop, CurvePoint, ScalarCurve};
pub use engine::{EngineStats, ParticleEngine};
pub use hooks::EmitterHooks;
pub use persist::{load_emitter, load_emitter_string, save_emitter, save_emitter_string};
pub use playback::PlaybackState;
pub use pool::ParticlePool;
