//! Layered elevation synthesis over a [`HeightGrid`].
//!
//! Every operation is a full pass of a layer function
//! `(current, x, z) -> proposed` over the grid. Proposals go through one
//! write policy:
//! 1. clamp to `[0, amplitude]`
//! 2. skip the write if the cell's *current* value is below the threshold
//! 3. store (which widens the grid's running bounds)

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::TerrainConfig;
use crate::error::{Result, TerrainError};
use crate::grid::HeightGrid;
use crate::noise_map::HeightSampler;
use crate::noise_source::NoiseSource;

// =============================================================================
// WRITE POLICY
// =============================================================================

/// Clamp and freeze rules shared by every synthesis pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WritePolicy {
    pub amplitude: f64,
    /// Cells currently below this elevation are left untouched.
    pub threshold: Option<f64>,
}

impl WritePolicy {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(0.0, self.amplitude)
    }

    /// Clamp `value`, check the threshold against the old value, then store.
    /// Returns whether the cell was written.
    ///
    /// The grid's running bounds only see stored values. A proposal dropped by
    /// the threshold never widens them.
    pub fn write(&self, grid: &mut HeightGrid, x: usize, z: usize, value: f64) -> bool {
        let value = self.clamp(value);
        if let Some(threshold) = self.threshold {
            if grid.get(x as isize, z as isize) < threshold {
                return false;
            }
        }
        grid.set(x, z, value);
        true
    }

    /// Run `layer` over every cell (z outer, x inner) and write its proposals.
    /// Returns how many cells were written.
    pub fn apply<F>(&self, grid: &mut HeightGrid, mut layer: F) -> usize
    where
        F: FnMut(f64, usize, usize) -> f64,
    {
        let size = grid.size();
        let mut written = 0;
        for z in 0..size {
            for x in 0..size {
                let current = grid.get(x as isize, z as isize);
                let proposed = layer(current, x, z);
                if self.write(grid, x, z, proposed) {
                    written += 1;
                }
            }
        }
        written
    }
}

// =============================================================================
// LAYER PARAMETERS
// =============================================================================

/// How a fractal layer combines with the existing elevation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LayerMode {
    /// Add to the current value.
    #[default]
    Accumulate,
    /// Overwrite the current value.
    Replace,
}

/// Parameters for a fractal Brownian motion layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalLayer {
    pub octaves: u32,
    pub persistence: f64,
    /// Multiplier on `amplitude` for this layer's contribution.
    pub scale: f64,
    /// Shift of the sampled noise window, in cells.
    pub offset: (i64, i64),
    pub mode: LayerMode,
}

impl Default for FractalLayer {
    fn default() -> Self {
        Self {
            octaves: 6,
            persistence: 2.52,
            scale: 1.0,
            offset: (0, 0),
            mode: LayerMode::Accumulate,
        }
    }
}

/// A single Voronoi peak.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub x: usize,
    pub z: usize,
    pub height: f64,
}

// =============================================================================
// SYNTHESIZER
// =============================================================================

/// Applies elevation layers to a grid it borrows for the duration of each pass.
pub struct TerrainSynthesizer<R = ChaCha8Rng> {
    noise: NoiseSource,
    rng: R,
    policy: WritePolicy,
}

impl TerrainSynthesizer<ChaCha8Rng> {
    /// Validate `config` and seed both the noise and the RNG from it.
    pub fn from_config(config: &TerrainConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.resolved_seed();
        let noise = NoiseSource::new(seed, config.frequency, config.octaves)?;
        info!(seed, amplitude = config.amplitude, "terrain synthesizer ready");

        let mut synth = Self::with_rng(noise, ChaCha8Rng::seed_from_u64(seed), config.amplitude)?;
        synth.set_threshold(config.threshold);
        Ok(synth)
    }
}

impl<R: RngCore> TerrainSynthesizer<R> {
    /// Build from an explicit noise source and random source.
    pub fn with_rng(noise: NoiseSource, rng: R, amplitude: f64) -> Result<Self> {
        if !(amplitude.is_finite() && amplitude > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "amplitude must be positive, got {}",
                amplitude
            )));
        }
        Ok(Self {
            noise,
            rng,
            policy: WritePolicy { amplitude, threshold: None },
        })
    }

    pub fn amplitude(&self) -> f64 {
        self.policy.amplitude
    }

    pub fn noise(&self) -> &NoiseSource {
        &self.noise
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn set_threshold(&mut self, threshold: Option<f64>) {
        self.policy.threshold = threshold;
    }

    pub fn disable_threshold(&mut self) {
        self.policy.threshold = None;
    }

    /// Octave noise scaled to the amplitude; `0.0` for negative coordinates.
    pub fn sample_height(&self, x: isize, z: isize) -> f64 {
        if x < 0 || z < 0 {
            return 0.0;
        }
        self.noise.octave_noise(x as f64, z as f64) * self.policy.amplitude
    }

    /// Set every cell to a uniformly random whole number in `[0, amplitude]`.
    pub fn fill_random(&mut self, grid: &mut HeightGrid) {
        let top = self.policy.amplitude.floor() as u64;
        let rng = &mut self.rng;
        let written = self.policy.apply(grid, |_, _, _| rng.gen_range(0..=top) as f64);
        debug!(written, "random fill");
    }

    /// Add (or replace with) fBm noise scaled by `amplitude * scale`.
    pub fn add_fractal_layer(&mut self, grid: &mut HeightGrid, layer: &FractalLayer) -> Result<()> {
        if layer.octaves == 0 {
            return Err(TerrainError::InvalidConfig("fractal layer needs at least one octave".to_string()));
        }
        if !(layer.persistence.is_finite() && layer.persistence > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "fractal persistence must be positive, got {}",
                layer.persistence
            )));
        }

        let noise = &self.noise;
        let weight = self.policy.amplitude * layer.scale;
        let (ox, oz) = layer.offset;
        let written = self.policy.apply(grid, |current, x, z| {
            let sx = (x as i64 + ox) as f64;
            let sz = (z as i64 + oz) as f64;
            let t = noise.fractal(sx, sz, layer.octaves, layer.persistence) * weight;
            match layer.mode {
                LayerMode::Accumulate => current + t,
                LayerMode::Replace => t,
            }
        });
        info!(octaves = layer.octaves, persistence = layer.persistence, written, "fractal layer applied");
        Ok(())
    }

    /// Stamp `peak_count` random peaks, each with a random height in
    /// `[amplitude / 2, amplitude]`.
    pub fn add_voronoi_layer(&mut self, grid: &mut HeightGrid, peak_count: usize, dropoff: f64, falloff: f64) {
        let size = grid.size();
        let amplitude = self.policy.amplitude;
        for _ in 0..peak_count {
            let peak = Peak {
                x: self.rng.gen_range(0..size),
                z: self.rng.gen_range(0..size),
                height: self.rng.gen_range(amplitude / 2.0..=amplitude),
            };
            self.stamp_peak(grid, peak, dropoff, falloff);
        }
        info!(peak_count, dropoff, falloff, "voronoi layer applied");
    }

    /// Raise terrain around `peak`: each cell proposes
    /// `height - d * falloff - d^dropoff` and keeps the larger of that and its
    /// current value. The peak cell itself is set to `height`.
    pub fn stamp_peak(&mut self, grid: &mut HeightGrid, peak: Peak, dropoff: f64, falloff: f64) {
        let written = self.policy.apply(grid, |current, x, z| {
            if x == peak.x && z == peak.z {
                return peak.height;
            }
            let dx = x as f64 - peak.x as f64;
            let dz = z as f64 - peak.z as f64;
            let distance = (dx * dx + dz * dz).sqrt();
            let h = peak.height - distance * falloff - distance.powf(dropoff);
            current.max(h)
        });
        debug!(x = peak.x, z = peak.z, height = peak.height, written, "peak stamped");
    }

    /// Randomize the four corners in `[0, amplitude]`, then set the centre to
    /// their average plus another such offset.
    pub fn seed_corners(&mut self, grid: &mut HeightGrid) {
        let last = grid.size() - 1;
        let top = self.policy.amplitude.floor() as u64;
        for (x, z) in [(0, 0), (last, 0), (0, last), (last, last)] {
            let value = self.rng.gen_range(0..=top) as f64;
            self.policy.write(grid, x, z, value);
        }

        let l = last as isize;
        let average = (grid.get(0, 0) + grid.get(l, 0) + grid.get(0, l) + grid.get(l, l)) / 4.0;
        let mid = last / 2;
        let value = average + self.rng.gen_range(0..=top) as f64;
        self.policy.write(grid, mid, mid, value);
    }

    /// Diamond-square refinement over the usable width `size - 1`.
    ///
    /// Squares start at the full width and halve until their size drops below
    /// 2. Each round runs the diamond step (square centres from corner
    /// averages) and then the square step (edge midpoints from centre, two
    /// corners and the neighbouring square's centre, wrapped around the
    /// width). Random offsets are drawn from `[lo, hi]`, which starts at
    /// `[0, amplitude]` and is scaled by `dampener^-roughness` after every
    /// round. Squares that would reach past the grid are skipped, so widths
    /// that are powers of two are the ones fully covered.
    pub fn midpoint_displacement(&mut self, grid: &mut HeightGrid, roughness: f64, dampener: f64) -> Result<()> {
        if !(roughness.is_finite() && roughness >= 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "roughness must be non-negative, got {}",
                roughness
            )));
        }
        if !(dampener.is_finite() && dampener > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "dampener must be positive, got {}",
                dampener
            )));
        }

        let width = grid.size() - 1;
        let decay = dampener.powf(-roughness);
        let mut lo = 0.0;
        let mut hi = self.policy.amplitude;
        let mut size = width;
        let mut rounds = 0;

        while size >= 2 {
            let half = size / 2;

            // Diamond step
            for y in (0..width).step_by(size) {
                for x in (0..width).step_by(size) {
                    if x + size > width || y + size > width {
                        continue;
                    }
                    let average = corner_average(grid, x, y, size);
                    let offset = self.rng.gen_range(lo..=hi);
                    self.policy.write(grid, x + half, y + half, average + offset);
                }
            }

            // Square step
            for y in (0..width).step_by(size) {
                for x in (0..width).step_by(size) {
                    if x + size > width || y + size > width {
                        continue;
                    }
                    self.square_step(grid, x, y, size, width, (lo, hi));
                }
            }

            size = half;
            lo *= decay;
            hi *= decay;
            rounds += 1;
        }

        info!(roughness, dampener, rounds, "midpoint displacement applied");
        Ok(())
    }

    fn square_step(&mut self, grid: &mut HeightGrid, x: usize, y: usize, size: usize, width: usize, (lo, hi): (f64, f64)) {
        let half = size / 2;
        let (cx, cy) = (x + half, y + half);
        let (right, bottom) = (x + size, y + size);
        let wrap = |c: usize, d: isize| (c as isize + d).rem_euclid(width as isize);

        let step = size as isize;
        let above = wrap(cy, -step);
        let below = wrap(cy, step);
        let left_of = wrap(cx, -step);
        let right_of = wrap(cx, step);

        let center = height_at(grid, cx, cy);
        let top = (center + height_at(grid, x, y) + height_at(grid, right, y) + grid.get(cx as isize, above)) / 4.0;
        let offset = self.rng.gen_range(lo..=hi);
        self.policy.write(grid, cx, y, top + offset);

        let bottom_edge = (center + height_at(grid, x, bottom) + height_at(grid, right, bottom) + grid.get(cx as isize, below)) / 4.0;
        let offset = self.rng.gen_range(lo..=hi);
        self.policy.write(grid, cx, bottom, bottom_edge + offset);

        let left = (center + height_at(grid, x, y) + height_at(grid, x, bottom) + grid.get(left_of, cy as isize)) / 4.0;
        let offset = self.rng.gen_range(lo..=hi);
        self.policy.write(grid, x, cy, left + offset);

        let right_edge = (center + height_at(grid, right, y) + height_at(grid, right, bottom) + grid.get(right_of, cy as isize)) / 4.0;
        let offset = self.rng.gen_range(lo..=hi);
        self.policy.write(grid, right, cy, right_edge + offset);
    }

    /// Overwrite the grid with `sampler(x, z) * amplitude`.
    pub fn import_height_map(&mut self, grid: &mut HeightGrid, sampler: &impl HeightSampler) -> Result<()> {
        let size = grid.size();
        let (width, height) = sampler.dimensions();
        if width < size || height < size {
            return Err(TerrainError::SizeMismatch {
                expected: size,
                actual: width.min(height),
            });
        }

        let amplitude = self.policy.amplitude;
        let written = self.policy.apply(grid, |_, x, z| sampler.sample(x, z) * amplitude);
        info!(width, height, written, "height map imported");
        Ok(())
    }
}

fn height_at(grid: &HeightGrid, x: usize, z: usize) -> f64 {
    grid.get(x as isize, z as isize)
}

fn corner_average(grid: &HeightGrid, x: usize, y: usize, size: usize) -> f64 {
    let (x0, y0) = (x as isize, y as isize);
    let (x1, y1) = ((x + size) as isize, (y + size) as isize);
    (grid.get(x0, y0) + grid.get(x1, y0) + grid.get(x0, y1) + grid.get(x1, y1)) / 4.0
}
