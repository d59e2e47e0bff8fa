//! Lightweight xorshift32 PRNG for spawn randomization

use ember_core::Vec3;

pub struct ParticleRng {
    state: u32,
}

impl ParticleRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Sample a spawn direction from a cone of full angle `spread`
    /// around the emitter's up axis: polar angle uniform in
    /// [-spread/2, spread/2], azimuth uniform in [0, 2π).
    pub fn spawn_direction(&mut self, spread: f32) -> Vec3 {
        let angle = (self.next_f32() - 0.5) * spread;
        let azimuth = self.range(0.0, std::f32::consts::TAU);
        Vec3::new(
            angle.sin() * azimuth.cos(),
            angle.cos(),
            angle.sin() * azimuth.sin(),
        )
    }
}
