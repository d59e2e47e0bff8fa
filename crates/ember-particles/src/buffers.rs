//! Renderer-facing output buffers
//!
//! Four parallel arrays sized to the pool capacity, meant to be
//! uploaded verbatim: position (3×f32), color (3×f32, 0..1), size
//! (1×f32) and alpha (1×f32, 0..1). A dirty flag per buffer reports
//! whether it changed during the last tick; the engine clears the
//! flags at the start of each tick.

use ember_core::{Color, Vec3};

pub struct OutputBuffers {
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    alphas: Vec<f32>,
    positions_dirty: bool,
    colors_dirty: bool,
    sizes_dirty: bool,
    alphas_dirty: bool,
}

impl OutputBuffers {
    /// Allocate buffers for `capacity` particles, all hidden: sizes at
    /// the base size, colors at the base color, alphas at zero.
    pub fn new(capacity: usize, base_size: f32, base_color: Color) -> Self {
        let mut colors = Vec::with_capacity(capacity * 3);
        for _ in 0..capacity {
            colors.extend_from_slice(&[base_color.r, base_color.g, base_color.b]);
        }
        Self {
            positions: vec![0.0; capacity * 3],
            colors,
            sizes: vec![base_size; capacity],
            alphas: vec![0.0; capacity],
            positions_dirty: true,
            colors_dirty: true,
            sizes_dirty: true,
            alphas_dirty: true,
        }
    }

    pub fn capacity(&self) -> usize {
        self.sizes.len()
    }

    /// Forget last tick's dirty state; called at the top of each tick
    pub fn begin_tick(&mut self) {
        self.positions_dirty = false;
        self.colors_dirty = false;
        self.sizes_dirty = false;
        self.alphas_dirty = false;
    }

    pub fn write_position(&mut self, index: usize, p: Vec3) {
        let i3 = index * 3;
        self.positions[i3] = p.x;
        self.positions[i3 + 1] = p.y;
        self.positions[i3 + 2] = p.z;
        self.positions_dirty = true;
    }

    pub fn write_color(&mut self, index: usize, r: f32, g: f32, b: f32) {
        let i3 = index * 3;
        self.colors[i3] = r;
        self.colors[i3 + 1] = g;
        self.colors[i3 + 2] = b;
        self.colors_dirty = true;
    }

    pub fn write_size(&mut self, index: usize, size: f32) {
        self.sizes[index] = size;
        self.sizes_dirty = true;
    }

    pub fn write_alpha(&mut self, index: usize, alpha: f32) {
        self.alphas[index] = alpha;
        self.alphas_dirty = true;
    }

    /// Hide a particle: origin position, fully transparent
    pub fn hide(&mut self, index: usize) {
        self.write_position(index, Vec3::ZERO);
        self.write_alpha(index, 0.0);
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn alphas(&self) -> &[f32] {
        &self.alphas
    }

    pub fn positions_dirty(&self) -> bool {
        self.positions_dirty
    }

    pub fn colors_dirty(&self) -> bool {
        self.colors_dirty
    }

    pub fn sizes_dirty(&self) -> bool {
        self.sizes_dirty
    }

    pub fn alphas_dirty(&self) -> bool {
        self.alphas_dirty
    }

    /// Raw byte views for direct GPU upload
    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn colors_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn sizes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sizes)
    }

    pub fn alphas_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.alphas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffers_are_hidden_at_base_values() {
        let buffers = OutputBuffers::new(4, 2.0, Color::new(0.1, 0.2, 0.3, 1.0));
        assert_eq!(buffers.positions().len(), 12);
        assert_eq!(buffers.sizes(), &[2.0; 4]);
        assert_eq!(buffers.alphas(), &[0.0; 4]);
        assert!((buffers.colors()[3] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn writes_set_dirty_flags() {
        let mut buffers = OutputBuffers::new(2, 1.0, Color::WHITE);
        buffers.begin_tick();
        assert!(!buffers.positions_dirty());
        assert!(!buffers.sizes_dirty());

        buffers.write_position(1, Vec3::new(1.0, 2.0, 3.0));
        buffers.write_alpha(1, 0.5);
        assert!(buffers.positions_dirty());
        assert!(buffers.alphas_dirty());
        assert!(!buffers.sizes_dirty());
        assert!(!buffers.colors_dirty());
    }

    #[test]
    fn byte_views_match_float_lengths() {
        let buffers = OutputBuffers::new(3, 1.0, Color::WHITE);
        assert_eq!(buffers.positions_bytes().len(), 3 * 3 * 4);
        assert_eq!(buffers.alphas_bytes().len(), 3 * 4);
    }
}
