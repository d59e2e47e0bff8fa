//! Local ⇄ world space conversion for particle state
//!
//! World-space simulation integrates motion in world coordinates and
//! re-derives the render-frame (local) position through the emitter's
//! current world transform every tick, which is what makes particles
//! visually detach from a moving emitter. Switching spaces at runtime
//! is a pure change of basis: no particle moves on screen at the
//! instant of the switch.

use crate::config::SimulationSpace;
use crate::pool::ParticlePool;
use ember_core::{Transform, Vec3};

/// The emitter's world transform, current and previous frame
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitterTransformState {
    pub current: Transform,
    pub previous: Transform,
}

impl EmitterTransformState {
    pub fn new(current: Transform) -> Self {
        Self {
            current,
            previous: current,
        }
    }

    /// Install this frame's world transform (local transform composed
    /// with the host's parent chain)
    pub fn set_current(&mut self, transform: Transform) {
        self.current = transform;
    }

    /// Remember the current transform for next frame's delta queries
    pub fn snapshot_previous(&mut self) {
        self.previous = self.current;
    }
}

/// Map a point in the emitter's local frame to world coordinates
pub fn to_world_space(local: Vec3, emitter: &Transform) -> Vec3 {
    emitter.transform_point(local)
}

/// Map a world-frame point into the emitter's local frame
pub fn to_local_space(world: Vec3, emitter: &Transform) -> Vec3 {
    emitter.inverse_transform_point(world)
}

/// Re-express every active particle's position and velocity in the new
/// frame without altering its visual location.
///
/// Local→World fills the world arrays from the local state; World→Local
/// rewrites the local (render) state from the world arrays. Velocities
/// convert through rotation only, positions through the full transform.
pub fn convert_space(
    pool: &mut ParticlePool,
    from: SimulationSpace,
    to: SimulationSpace,
    emitter: &Transform,
) {
    if from == to {
        return;
    }
    for i in 0..pool.capacity() {
        if !pool.is_active(i) {
            continue;
        }
        match (from, to) {
            (SimulationSpace::Local, SimulationSpace::World) => {
                let world_pos = emitter.transform_point(pool.position(i));
                let world_vel = emitter.transform_vector(pool.velocity(i));
                pool.set_world_position(i, world_pos);
                pool.set_world_velocity(i, world_vel);
            }
            (SimulationSpace::World, SimulationSpace::Local) => {
                let local_pos = emitter.inverse_transform_point(pool.world_position(i));
                let local_vel = emitter.inverse_transform_vector(pool.world_velocity(i));
                pool.set_position(i, local_pos);
                pool.set_velocity(i, local_vel);
            }
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SpawnParams;
    use ember_core::Quat;

    const EPS: f32 = 1e-4;

    fn moved_emitter() -> Transform {
        Transform::from_position(Vec3::new(3.0, 1.0, -2.0))
            .with_rotation(Quat::from_axis_angle(Vec3::UP, 0.9))
    }

    #[test]
    fn point_round_trip_is_identity() {
        let emitter = moved_emitter();
        let p = Vec3::new(0.5, 2.0, 1.0);
        let back = to_local_space(to_world_space(p, &emitter), &emitter);
        assert!((back - p).length() < EPS);
    }

    #[test]
    fn space_switch_round_trip_preserves_local_state() {
        let emitter = moved_emitter();
        let mut pool = ParticlePool::new(4, 10.0).unwrap();
        for n in 0..3 {
            let i = pool.take_inactive().unwrap();
            pool.activate(
                i,
                SpawnParams {
                    position: Vec3::new(n as f32, 1.0, -0.5),
                    velocity: Vec3::new(0.0, 5.0, n as f32),
                    ..Default::default()
                },
            );
        }
        let before: Vec<(Vec3, Vec3)> = (0..3).map(|i| (pool.position(i), pool.velocity(i))).collect();

        convert_space(&mut pool, SimulationSpace::Local, SimulationSpace::World, &emitter);
        convert_space(&mut pool, SimulationSpace::World, SimulationSpace::Local, &emitter);

        for (i, (pos, vel)) in before.iter().enumerate() {
            assert!((pool.position(i) - *pos).length() < EPS);
            assert!((pool.velocity(i) - *vel).length() < EPS);
        }
    }

    #[test]
    fn inactive_particles_are_untouched() {
        let emitter = moved_emitter();
        let mut pool = ParticlePool::new(2, 1.0).unwrap();
        convert_space(&mut pool, SimulationSpace::Local, SimulationSpace::World, &emitter);
        assert_eq!(pool.world_position(0), Vec3::ZERO);
    }
}
