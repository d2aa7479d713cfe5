//! Externally built noise maps fed into height-map import.
//!
//! Maps are rendered with `noise::utils::PlaneMapBuilder` and hold raw module
//! output. The synthesizer reads them through [`HeightSampler`], which remaps
//! samples to `[0, 1]`. [`terrain_source`] is the stock graph used by the CLI.

use noise::utils::PlaneMapBuilder;
use noise::{Billow, Fbm, MultiFractal, NoiseFn, Perlin, RidgedMulti, ScaleBias, Select};

use crate::error::{Result, TerrainError};

pub use noise::utils::NoiseMap;

/// Largest side `NoiseMap` accepts.
pub const MAX_MAP_SIZE: usize = 32_766;

/// Noise-space window rendered by [`terrain_map`] before scrolling.
pub const TERRAIN_BOUNDS: (f64, f64) = (0.0, 2.0);

/// A per-cell source of normalized `[0, 1]` samples.
pub trait HeightSampler {
    /// `(width, height)` in cells.
    fn dimensions(&self) -> (usize, usize);

    fn sample(&self, x: usize, z: usize) -> f64;
}

/// Raw output (nominally `[-1, 1]`) is remapped to `[0, 1]` and clamped.
impl HeightSampler for NoiseMap {
    fn dimensions(&self) -> (usize, usize) {
        self.size()
    }

    fn sample(&self, x: usize, z: usize) -> f64 {
        ((self.get_value(x, z) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Shift a `(lower, upper)` bound pair by `offset` in noise space.
pub fn scroll(bounds: (f64, f64), offset: f64) -> (f64, f64) {
    (bounds.0 + offset, bounds.1 + offset)
}

/// Stock terrain graph: flattened billow plains and ridged mountains,
/// switched by a low-persistence fBm control.
pub fn terrain_source(seed: u32) -> impl NoiseFn<f64, 2> {
    let plains_base = Billow::<Perlin>::new(seed)
        .set_frequency(2.0)
        .set_octaves(8)
        .set_lacunarity(2.5);
    let plains = ScaleBias::new(plains_base).set_scale(0.02).set_bias(-0.75);

    let mountains = RidgedMulti::<Perlin>::new(seed.wrapping_add(1))
        .set_octaves(8)
        .set_frequency(2.0)
        .set_lacunarity(1.2);

    let control = Fbm::<Perlin>::new(seed.wrapping_add(2))
        .set_octaves(8)
        .set_frequency(2.0)
        .set_lacunarity(1.5)
        .set_persistence(0.25);

    Select::new(plains, mountains, control)
        .set_bounds(0.8, 1000.0)
        .set_falloff(0.9)
}

/// Render [`terrain_source`] into a seamless `size x size` map.
///
/// `offset` scrolls the [`TERRAIN_BOUNDS`] window on X and Z.
pub fn terrain_map(seed: u32, size: usize, offset: (f64, f64)) -> Result<NoiseMap> {
    if size > MAX_MAP_SIZE {
        return Err(TerrainError::InvalidConfig(format!(
            "noise map size {size} exceeds {MAX_MAP_SIZE}"
        )));
    }

    let source = terrain_source(seed);
    let (x0, x1) = scroll(TERRAIN_BOUNDS, offset.0);
    let (z0, z1) = scroll(TERRAIN_BOUNDS, offset.1);
    Ok(PlaneMapBuilder::new_fn(|point: [f64; 2]| source.get(point))
        .set_size(size, size)
        .set_x_bounds(x0, x1)
        .set_y_bounds(z0, z1)
        .set_is_seamless(true)
        .build())
}
