//! The particle engine: per-tick orchestration and the host-facing
//! control interface
//!
//! Each tick runs, in order: state-machine advance → emission → motion
//! integration → curve evaluation → output buffer write. The engine is
//! single-threaded and does all work inside `tick`; the host serializes
//! calls (one per render frame).

use crate::buffers::OutputBuffers;
use crate::config::{
    check_finite, check_non_negative, check_positive, EmitterConfig, SimulationSpace, StopAction,
};
use crate::curves::{ColorCurve, ScalarCurve};
use crate::hooks::EmitterHooks;
use crate::playback::{PlayTransition, Playback, PlaybackState, WindowEvent};
use crate::pool::{ParticlePool, SpawnParams};
use crate::rand::ParticleRng;
use crate::space::{convert_space, EmitterTransformState};
use ember_core::{EmberError, EmitterId, Result, Transform, Vec3};

/// Ceiling on a single tick's delta; guards against debugger pauses
/// and clock glitches producing an unbounded number of emission steps.
const MAX_DELTA: f32 = 0.25;

/// Simulation step at which `prewarm` runs the warm-up lifecycle
const PREWARM_STEP: f32 = 1.0 / 60.0;

/// Point-in-time utilization snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStats {
    pub capacity: usize,
    pub active: usize,
    pub inactive: usize,
    /// `active / capacity`
    pub utilization: f32,
    pub state: PlaybackState,
    pub simulation_space: SimulationSpace,
    pub loop_count: u32,
}

/// A single particle emitter simulation, driven by `tick(delta)`.
pub struct ParticleEngine {
    id: EmitterId,
    name: String,
    config: EmitterConfig,
    /// The emitter's own transform relative to its host scene node
    local_transform: Transform,
    /// World transform of the host node, pushed in by the host
    parent_world: Transform,
    transform: EmitterTransformState,
    pool: ParticlePool,
    playback: Playback,
    buffers: OutputBuffers,
    rng: ParticleRng,
    hooks: Option<Box<dyn EmitterHooks>>,
    destroy_requested: bool,
    /// Deferred play scheduled by `restart()`
    pending_play: bool,
}

impl ParticleEngine {
    /// Create an engine from a configuration. Plays immediately when
    /// `play_on_awake` is set (prewarming first if requested).
    pub fn new(config: EmitterConfig) -> Result<Self> {
        Self::with_name(config, "emitter")
    }

    pub fn with_name(config: EmitterConfig, name: impl Into<String>) -> Result<Self> {
        let mut engine = Self::build(config, name.into(), EmitterId::new(), Transform::IDENTITY)?;
        if engine.config.play_on_awake {
            engine.play();
        }
        Ok(engine)
    }

    /// Reconstruct an engine from persisted data. The result is
    /// stopped and not-yet-started regardless of `play_on_awake`;
    /// the host decides when playback begins.
    pub fn restored(
        config: EmitterConfig,
        name: impl Into<String>,
        id: EmitterId,
        local_transform: Transform,
    ) -> Result<Self> {
        Self::build(config, name.into(), id, local_transform)
    }

    fn build(
        mut config: EmitterConfig,
        name: String,
        id: EmitterId,
        local_transform: Transform,
    ) -> Result<Self> {
        config.validate()?;
        config.normalize_curves();
        let pool = ParticlePool::new(config.particle_count, config.max_life)?;
        let buffers = OutputBuffers::new(config.particle_count, config.size, config.color);
        let seed = (id.raw() as u32) ^ 0x9E37_79B9;
        Ok(Self {
            id,
            name,
            local_transform,
            parent_world: Transform::IDENTITY,
            transform: EmitterTransformState::new(local_transform),
            pool,
            playback: Playback::new(),
            buffers,
            rng: ParticleRng::new(seed),
            hooks: None,
            destroy_requested: false,
            pending_play: false,
            config,
        })
    }

    // ── Per-frame step ──

    /// Advance the simulation by `delta` seconds.
    ///
    /// Non-finite or negative deltas are treated as zero; anything
    /// above 250 ms is clamped. A no-op in `Stopped` and `Paused`.
    pub fn tick(&mut self, delta: f32) {
        if self.destroy_requested {
            return;
        }
        if self.pending_play {
            self.pending_play = false;
            self.play();
        }
        let delta = if delta.is_finite() && delta > 0.0 {
            delta.min(MAX_DELTA)
        } else {
            0.0
        };
        if self.playback.state() != PlaybackState::Playing {
            return;
        }

        self.buffers.begin_tick();

        let window_event =
            self.playback
                .advance(delta as f64, self.config.looping, self.config.duration as f64);
        match window_event {
            Some(WindowEvent::EmissionComplete) => self.fire(|h| h.on_emission_complete()),
            Some(WindowEvent::Loop(count)) => self.fire(|h| h.on_loop(count)),
            None => {}
        }

        self.transform
            .set_current(self.local_transform.compose(&self.parent_world));

        let budget = self.playback.spawn_budget(
            self.config.burst,
            self.config.burst_count,
            self.config.emission_rate as f64,
        );
        let budget = (budget as usize).min(self.pool.inactive_count());
        for _ in 0..budget {
            self.spawn_particle();
        }

        self.integrate(delta);

        self.transform.snapshot_previous();
        self.resolve_stop_action();
    }

    fn spawn_particle(&mut self) {
        let Some(index) = self.pool.take_inactive() else {
            return;
        };
        let speed = self.config.start_speed + self.rng.next_f32() * self.config.speed_variation;
        let local_vel = self.rng.spawn_direction(self.config.spread) * speed;

        let params = match self.config.simulation_space {
            SimulationSpace::Local => SpawnParams {
                position: Vec3::ZERO,
                velocity: local_vel,
                world_position: Vec3::ZERO,
                world_velocity: local_vel,
            },
            SimulationSpace::World => {
                let emitter = &self.transform.current;
                let world_position = emitter.position;
                SpawnParams {
                    // The emitter origin expressed in its own frame
                    position: emitter.inverse_transform_point(world_position),
                    velocity: local_vel,
                    world_position,
                    world_velocity: emitter.transform_vector(local_vel),
                }
            }
        };
        self.pool.activate(index, params);
    }

    /// Age, move and shade every active particle. All active particles
    /// update every tick; partial updates would desynchronize visual
    /// motion from simulated time.
    fn integrate(&mut self, delta: f32) {
        let max_life = self.pool.max_life();

        for i in 0..self.pool.capacity() {
            if !self.pool.is_active(i) {
                continue;
            }
            let life = self.pool.advance_age(i, delta);
            if life >= max_life {
                self.pool.deactivate(i);
                self.buffers.hide(i);
                continue;
            }

            match self.config.simulation_space {
                SimulationSpace::World => {
                    let mut vel = self.pool.world_velocity(i);
                    vel.y += self.config.gravity * delta;
                    self.pool.set_world_velocity(i, vel);

                    let pos = self.pool.world_position(i) + vel * delta;
                    self.pool.set_world_position(i, pos);

                    // Render position always lives in the local frame
                    let local = self.transform.current.inverse_transform_point(pos);
                    self.pool.set_position(i, local);
                }
                SimulationSpace::Local => {
                    let mut vel = self.pool.velocity(i);
                    vel.y += self.config.gravity * delta;
                    self.pool.set_velocity(i, vel);

                    let pos = self.pool.position(i) + vel * delta;
                    self.pool.set_position(i, pos);
                }
            }

            let t = (life / max_life).clamp(0.0, 1.0);

            if let Some(curve) = &self.config.size_curve {
                self.buffers.write_size(i, self.config.size * curve.evaluate(t));
            }
            if let Some(curve) = &self.config.color_curve {
                let c = curve.evaluate(t);
                self.buffers.write_color(i, c.r, c.g, c.b);
                self.buffers.write_alpha(i, c.a * self.config.opacity);
            } else {
                // Deterministic linear fade of the base color/opacity
                let fade = 1.0 - self.pool.age(i) / max_life;
                let base = self.config.color;
                self.buffers
                    .write_color(i, base.r * fade, base.g * fade, base.b * fade);
                self.buffers.write_alpha(i, self.config.opacity * fade);
            }
            self.buffers.write_position(i, self.pool.position(i));
        }
    }

    fn resolve_stop_action(&mut self) {
        if !self.playback.has_finished_emission()
            || self.config.looping
            || self.pool.active_count() > 0
        {
            return;
        }
        match self.config.stop_action {
            StopAction::None => {}
            StopAction::Disable => self.stop(),
            StopAction::Destroy => {
                self.stop();
                self.destroy_requested = true;
            }
        }
    }

    // ── Control interface ──

    /// Start playing, or resume when paused. A fresh start clears the
    /// pool, resets all accumulators and fires `on_start`.
    pub fn play(&mut self) {
        match self.playback.play() {
            Some(PlayTransition::Started) => {
                self.pool.reset();
                self.reset_buffers();
                self.transform
                    .set_current(self.local_transform.compose(&self.parent_world));
                self.transform.snapshot_previous();
                self.fire(|h| h.on_start());
                if self.config.prewarm {
                    self.prewarm();
                }
            }
            Some(PlayTransition::Resumed) => self.fire(|h| h.on_resume()),
            None => {}
        }
    }

    /// Freeze the simulation. No particle ages while paused.
    pub fn pause(&mut self) {
        if self.playback.pause() {
            self.fire(|h| h.on_pause());
        }
    }

    pub fn resume(&mut self) {
        if self.playback.resume() {
            self.fire(|h| h.on_resume());
        }
    }

    /// Clear every particle, reset all accumulators and return to
    /// `Stopped`. Output positions are forced to the hidden sentinel.
    pub fn stop(&mut self) {
        if self.playback.stop() {
            self.pool.reset();
            self.reset_buffers();
            self.fire(|h| h.on_stop());
        }
    }

    /// Stop now, play again on the next tick
    pub fn restart(&mut self) {
        self.stop();
        self.pending_play = true;
    }

    /// Switch the integration frame, re-expressing every active
    /// particle in the new frame without moving it on screen.
    pub fn set_simulation_space(&mut self, space: SimulationSpace) {
        let old = self.config.simulation_space;
        if old == space {
            return;
        }
        self.transform
            .set_current(self.local_transform.compose(&self.parent_world));
        convert_space(&mut self.pool, old, space, &self.transform.current);
        self.config.simulation_space = space;
        self.fire(|h| h.on_simulation_space_changed(old, space));
    }

    pub fn toggle_simulation_space(&mut self) {
        let next = match self.config.simulation_space {
            SimulationSpace::Local => SimulationSpace::World,
            SimulationSpace::World => SimulationSpace::Local,
        };
        self.set_simulation_space(next);
    }

    /// Destructive capacity change: discards all particle state and
    /// reallocates the pool and output buffers.
    pub fn set_particle_count(&mut self, count: usize) -> Result<()> {
        self.pool.set_capacity(count)?;
        self.config.particle_count = count;
        self.reset_buffers();
        Ok(())
    }

    /// Set a scalar configuration field by name.
    ///
    /// Values are validated at this boundary; a bad value is rejected
    /// and the running simulation is untouched.
    pub fn set_property(&mut self, name: &str, value: f64) -> Result<()> {
        let v = value as f32;
        match name {
            "max_life" => {
                check_positive("max_life", v)?;
                self.config.max_life = v;
                self.pool.set_max_life(v);
                // A shrink deactivates outlived particles outside the
                // tick loop, so the output buffers must be hidden here
                for i in 0..self.pool.capacity() {
                    if !self.pool.is_active(i) {
                        self.buffers.hide(i);
                    }
                }
            }
            "start_speed" => {
                check_finite("start_speed", v)?;
                self.config.start_speed = v;
            }
            "speed_variation" => {
                check_finite("speed_variation", v)?;
                self.config.speed_variation = v;
            }
            "emission_rate" => {
                check_non_negative("emission_rate", v)?;
                self.config.emission_rate = v;
            }
            "spread" => {
                check_finite("spread", v)?;
                self.config.spread = v;
            }
            "gravity" => {
                check_finite("gravity", v)?;
                self.config.gravity = v;
            }
            "size" => {
                check_positive("size", v)?;
                self.config.size = v;
                // Without a size curve nothing rewrites the buffer per tick
                if self.config.size_curve.is_none() {
                    for i in 0..self.buffers.capacity() {
                        self.buffers.write_size(i, v);
                    }
                }
            }
            "opacity" => {
                if !(0.0..=1.0).contains(&v) {
                    return Err(EmberError::ValueOutOfRange {
                        field: "opacity".to_string(),
                        min: 0.0,
                        max: 1.0,
                        value,
                    });
                }
                self.config.opacity = v;
            }
            "duration" => {
                check_positive("duration", v)?;
                self.config.duration = v;
            }
            "burst_count" => {
                check_non_negative("burst_count", v)?;
                self.config.burst_count = value as u32;
            }
            "particle_count" => {
                if value < 1.0 {
                    return Err(EmberError::ValueOutOfRange {
                        field: "particle_count".to_string(),
                        min: 1.0,
                        max: usize::MAX as f64,
                        value,
                    });
                }
                self.set_particle_count(value as usize)?;
            }
            other => return Err(EmberError::UnknownProperty(other.to_string())),
        }
        Ok(())
    }

    pub fn set_burst(&mut self, burst: bool) {
        self.config.burst = burst;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.config.looping = looping;
    }

    pub fn set_stop_action(&mut self, action: StopAction) {
        self.config.stop_action = action;
    }

    pub fn set_prewarm(&mut self, prewarm: bool) {
        self.config.prewarm = prewarm;
    }

    /// Enabling play-on-awake on a not-yet-started engine starts it
    pub fn set_play_on_awake(&mut self, value: bool) {
        self.config.play_on_awake = value;
        if value && !self.playback.has_started() {
            self.play();
        }
    }

    pub fn set_base_color(&mut self, color: ember_core::Color) {
        self.config.color = color;
    }

    /// Install or clear the size-over-life curve. The curve arrives
    /// pre-sorted by construction; `None` restores the base size.
    pub fn set_size_curve(&mut self, curve: Option<ScalarCurve>) {
        let restore = curve.is_none();
        self.config.size_curve = curve.map(ScalarCurve::rebuilt);
        if restore {
            for i in 0..self.buffers.capacity() {
                self.buffers.write_size(i, self.config.size);
            }
        }
    }

    /// Install or clear the color-over-life stop list
    pub fn set_color_curve(&mut self, curve: Option<ColorCurve>) {
        self.config.color_curve = curve.map(ColorCurve::rebuilt);
    }

    /// Install lifecycle hooks. Hooks are advisory only.
    pub fn set_hooks(&mut self, hooks: Box<dyn EmitterHooks>) {
        self.hooks = Some(hooks);
    }

    pub fn clear_hooks(&mut self) {
        self.hooks = None;
    }

    // ── Transform plumbing ──

    pub fn local_transform(&self) -> Transform {
        self.local_transform
    }

    pub fn set_local_transform(&mut self, transform: Transform) {
        self.local_transform = transform;
    }

    /// Push the host scene node's world transform; the engine composes
    /// its own local transform on top each tick.
    pub fn set_parent_world_transform(&mut self, transform: Transform) {
        self.parent_world = transform;
    }

    /// The emitter's world transform as of the last tick
    pub fn world_transform(&self) -> Transform {
        self.transform.current
    }

    // ── Queries ──

    pub fn id(&self) -> EmitterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn has_started(&self) -> bool {
        self.playback.has_started()
    }

    pub fn simulation_space(&self) -> SimulationSpace {
        self.config.simulation_space
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn time(&self) -> f64 {
        self.playback.time()
    }

    pub fn is_emission_complete(&self) -> bool {
        self.playback.has_finished_emission()
    }

    /// Fraction of the current emission window that has elapsed
    pub fn emission_progress(&self) -> f32 {
        if self.config.duration > 0.0 {
            (self.playback.emission_time() / self.config.duration as f64).min(1.0) as f32
        } else {
            1.0
        }
    }

    pub fn remaining_emission_time(&self) -> f32 {
        (self.config.duration as f64 - self.playback.emission_time()).max(0.0) as f32
    }

    /// Set after `StopAction::Destroy` resolves; the host should drop
    /// this engine when it observes the flag.
    pub fn destroy_requested(&self) -> bool {
        self.destroy_requested
    }

    pub fn buffers(&self) -> &OutputBuffers {
        &self.buffers
    }

    /// Read-only access to the simulation pool (for the host's debug views)
    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn stats(&self) -> EngineStats {
        let capacity = self.pool.capacity();
        let active = self.pool.active_count();
        EngineStats {
            capacity,
            active,
            inactive: capacity - active,
            utilization: active as f32 / capacity as f32,
            state: self.playback.state(),
            simulation_space: self.config.simulation_space,
            loop_count: self.playback.loop_count(),
        }
    }

    // ── Internals ──

    fn reset_buffers(&mut self) {
        self.buffers = OutputBuffers::new(self.pool.capacity(), self.config.size, self.config.color);
    }

    /// Run one full particle lifecycle at a fixed step so the system
    /// appears to have been running already
    fn prewarm(&mut self) {
        let steps = (self.config.max_life / PREWARM_STEP).ceil() as u32;
        for _ in 0..steps {
            self.tick(PREWARM_STEP);
        }
    }

    fn fire(&mut self, f: impl FnOnce(&mut dyn EmitterHooks)) {
        if let Some(hooks) = self.hooks.as_deref_mut() {
            f(hooks);
        }
    }
}
