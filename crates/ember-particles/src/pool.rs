//! Fixed-capacity particle pool: SoA state arrays plus an
//! active/inactive index partition
//!
//! Invariants held at all times:
//! - `life[i] < max_life  ⇔  i is active`
//! - active count + inactive count == capacity
//!
//! Particles are created dead and only become active through
//! [`ParticlePool::activate`]; they return to the inactive set via
//! [`ParticlePool::deactivate`] or en masse through [`ParticlePool::reset`].

use ember_core::{EmberError, Result, Vec3};

/// Hard ceiling on pool capacity; a request above this is reported as
/// an allocation failure at configure time rather than an abort later.
pub const MAX_CAPACITY: usize = 1_000_000;

/// State written into a slot when a particle is activated
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnParams {
    /// Render-frame (local) position
    pub position: Vec3,
    /// Render-frame velocity
    pub velocity: Vec3,
    /// World-frame position (mirrors `position` in local-space mode)
    pub world_position: Vec3,
    /// World-frame velocity (mirrors `velocity` in local-space mode)
    pub world_velocity: Vec3,
}

/// Parallel-array particle storage partitioned into active and
/// inactive index sets.
///
/// Positions are always stored in the emitter's local frame (the frame
/// the renderer consumes); the world arrays are only authoritative in
/// world-space simulation mode.
pub struct ParticlePool {
    capacity: usize,
    max_life: f32,
    positions: Vec<f32>,
    velocities: Vec<f32>,
    world_positions: Vec<f32>,
    world_velocities: Vec<f32>,
    ages: Vec<f32>,
    life: Vec<f32>,
    /// Stack of inactive slot indices; spawn order is arbitrary
    inactive: Vec<usize>,
    inactive_flags: Vec<bool>,
}

impl ParticlePool {
    pub fn new(capacity: usize, max_life: f32) -> Result<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(EmberError::PoolAllocationError(format!(
                "capacity {capacity} outside 1..={MAX_CAPACITY}"
            )));
        }
        let mut pool = Self {
            capacity,
            max_life,
            positions: vec![0.0; capacity * 3],
            velocities: vec![0.0; capacity * 3],
            world_positions: vec![0.0; capacity * 3],
            world_velocities: vec![0.0; capacity * 3],
            ages: vec![0.0; capacity],
            life: vec![max_life; capacity],
            inactive: Vec::with_capacity(capacity),
            inactive_flags: vec![true; capacity],
        };
        pool.reset();
        Ok(pool)
    }

    /// Return every particle to the inactive set and zero all state
    pub fn reset(&mut self) {
        self.positions.fill(0.0);
        self.velocities.fill(0.0);
        self.world_positions.fill(0.0);
        self.world_velocities.fill(0.0);
        self.ages.fill(0.0);
        self.life.fill(self.max_life);
        self.inactive_flags.fill(true);
        self.inactive.clear();
        // Reverse order so take_inactive hands out ascending indices
        self.inactive.extend((0..self.capacity).rev());
    }

    /// Destructive capacity change: discards all particle state
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        *self = Self::new(capacity, self.max_life)?;
        Ok(())
    }

    /// Change the lifetime sentinel. Inactive slots are re-stamped;
    /// active particles whose accumulated life now exceeds the new
    /// maximum are deactivated to keep the partition invariant.
    pub fn set_max_life(&mut self, max_life: f32) {
        self.max_life = max_life;
        for i in 0..self.capacity {
            if self.inactive_flags[i] {
                self.life[i] = max_life;
            } else if self.life[i] >= max_life {
                self.deactivate(i);
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_life(&self) -> f32 {
        self.max_life
    }

    pub fn active_count(&self) -> usize {
        self.capacity - self.inactive.len()
    }

    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    pub fn is_active(&self, index: usize) -> bool {
        !self.inactive_flags[index]
    }

    /// Pop an arbitrary member of the inactive set. Must be followed by
    /// [`ParticlePool::activate`] on the returned index.
    pub fn take_inactive(&mut self) -> Option<usize> {
        self.inactive.pop()
    }

    /// Bring a slot obtained from [`ParticlePool::take_inactive`] to life
    pub fn activate(&mut self, index: usize, params: SpawnParams) {
        debug_assert!(self.inactive_flags[index], "activate on live particle");
        self.inactive_flags[index] = false;
        self.set_position(index, params.position);
        self.set_velocity(index, params.velocity);
        self.set_world_position(index, params.world_position);
        self.set_world_velocity(index, params.world_velocity);
        self.ages[index] = 0.0;
        self.life[index] = 0.0;
    }

    /// Kill a particle: stamp the lifetime sentinel, hide it at the
    /// origin and return its index to the inactive set.
    pub fn deactivate(&mut self, index: usize) {
        if self.inactive_flags[index] {
            return;
        }
        self.inactive_flags[index] = true;
        self.life[index] = self.max_life;
        self.ages[index] = 0.0;
        self.set_position(index, Vec3::ZERO);
        self.set_world_position(index, Vec3::ZERO);
        self.inactive.push(index);
    }

    /// Age a particle by `delta`, returning the updated life value
    pub fn advance_age(&mut self, index: usize, delta: f32) -> f32 {
        self.ages[index] += delta;
        self.life[index] += delta;
        self.life[index]
    }

    pub fn age(&self, index: usize) -> f32 {
        self.ages[index]
    }

    pub fn life(&self, index: usize) -> f32 {
        self.life[index]
    }

    pub fn position(&self, index: usize) -> Vec3 {
        read_vec3(&self.positions, index)
    }

    pub fn set_position(&mut self, index: usize, v: Vec3) {
        write_vec3(&mut self.positions, index, v);
    }

    pub fn velocity(&self, index: usize) -> Vec3 {
        read_vec3(&self.velocities, index)
    }

    pub fn set_velocity(&mut self, index: usize, v: Vec3) {
        write_vec3(&mut self.velocities, index, v);
    }

    pub fn world_position(&self, index: usize) -> Vec3 {
        read_vec3(&self.world_positions, index)
    }

    pub fn set_world_position(&mut self, index: usize, v: Vec3) {
        write_vec3(&mut self.world_positions, index, v);
    }

    pub fn world_velocity(&self, index: usize) -> Vec3 {
        read_vec3(&self.world_velocities, index)
    }

    pub fn set_world_velocity(&mut self, index: usize, v: Vec3) {
        write_vec3(&mut self.world_velocities, index, v);
    }
}

fn read_vec3(arr: &[f32], index: usize) -> Vec3 {
    let i3 = index * 3;
    Vec3::new(arr[i3], arr[i3 + 1], arr[i3 + 2])
}

fn write_vec3(arr: &mut [f32], index: usize, v: Vec3) {
    let i3 = index * 3;
    arr[i3] = v.x;
    arr[i3 + 1] = v.y;
    arr[i3 + 2] = v.z;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(pool: &ParticlePool) {
        let mut active = 0;
        for i in 0..pool.capacity() {
            let by_life = pool.life(i) < pool.max_life();
            assert_eq!(by_life, pool.is_active(i), "slot {i}");
            if by_life {
                active += 1;
            }
        }
        assert_eq!(active, pool.active_count());
        assert_eq!(active + pool.inactive_count(), pool.capacity());
    }

    #[test]
    fn new_pool_is_fully_inactive() {
        let pool = ParticlePool::new(8, 2.0).unwrap();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.inactive_count(), 8);
        assert_partition(&pool);
    }

    #[test]
    fn zero_capacity_fails() {
        assert!(ParticlePool::new(0, 1.0).is_err());
        assert!(ParticlePool::new(MAX_CAPACITY + 1, 1.0).is_err());
    }

    #[test]
    fn activate_and_deactivate_keep_partition() {
        let mut pool = ParticlePool::new(4, 1.0).unwrap();
        let i = pool.take_inactive().unwrap();
        pool.activate(
            i,
            SpawnParams {
                velocity: Vec3::new(1.0, 2.0, 3.0),
                ..Default::default()
            },
        );
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.life(i), 0.0);
        assert_partition(&pool);

        pool.deactivate(i);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.position(i), Vec3::ZERO);
        assert_partition(&pool);
    }

    #[test]
    fn deactivate_twice_is_harmless() {
        let mut pool = ParticlePool::new(2, 1.0).unwrap();
        let i = pool.take_inactive().unwrap();
        pool.activate(i, SpawnParams::default());
        pool.deactivate(i);
        pool.deactivate(i);
        assert_eq!(pool.inactive_count(), 2);
        assert_partition(&pool);
    }

    #[test]
    fn exhausted_pool_returns_none() {
        let mut pool = ParticlePool::new(2, 1.0).unwrap();
        for _ in 0..2 {
            let i = pool.take_inactive().unwrap();
            pool.activate(i, SpawnParams::default());
        }
        assert!(pool.take_inactive().is_none());
    }

    #[test]
    fn capacity_change_is_destructive() {
        let mut pool = ParticlePool::new(4, 1.0).unwrap();
        let i = pool.take_inactive().unwrap();
        pool.activate(i, SpawnParams::default());

        pool.set_capacity(16).unwrap();
        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.active_count(), 0);
        assert_partition(&pool);
    }

    #[test]
    fn shrinking_max_life_deactivates_outlived_particles() {
        let mut pool = ParticlePool::new(2, 10.0).unwrap();
        let i = pool.take_inactive().unwrap();
        pool.activate(i, SpawnParams::default());
        pool.advance_age(i, 5.0);

        pool.set_max_life(3.0);
        assert_eq!(pool.active_count(), 0);
        assert_partition(&pool);
    }
}
