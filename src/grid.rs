use crate::error::{Result, TerrainError};

/// A square heightfield of `size x size` elevation samples.
///
/// Cells are stored row-major (`z * size + x`). Reads outside the grid return
/// `0.0`, which lets neighbour lookups at the border skip bounds checks.
/// The running `min`/`max` only ever widen; see [`HeightGrid::recompute_bounds`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    size: usize,
    data: Vec<f64>,
    min: f64,
    max: f64,
}

impl HeightGrid {
    /// Allocate a zero-filled grid.
    ///
    /// # Panics
    /// If `size < 2`. Validate with [`crate::config::TerrainConfig::validate`] first.
    pub fn new(size: usize) -> Self {
        assert!(size >= 2, "height grid needs at least 2 samples per side, got {}", size);
        Self {
            size,
            data: vec![0.0; size * size],
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, x: usize, z: usize) -> usize {
        z * self.size + x
    }

    pub fn contains(&self, x: isize, z: isize) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.size && (z as usize) < self.size
    }

    /// Elevation at `(x, z)`, or `0.0` outside the grid.
    pub fn get(&self, x: isize, z: isize) -> f64 {
        if !self.contains(x, z) {
            return 0.0;
        }
        self.data[self.index(x as usize, z as usize)]
    }

    /// Store `value` at `(x, z)` and widen the running bounds.
    ///
    /// # Panics
    /// If `(x, z)` lies outside the grid.
    pub fn set(&mut self, x: usize, z: usize, value: f64) {
        assert!(
            x < self.size && z < self.size,
            "cell ({}, {}) is outside a {}x{} grid",
            x, z, self.size, self.size
        );
        self.store(x, z, value);
    }

    /// Like [`HeightGrid::set`], but reports out-of-range writes as an error.
    pub fn try_set(&mut self, x: usize, z: usize, value: f64) -> Result<()> {
        if x >= self.size || z >= self.size {
            return Err(TerrainError::OutOfBounds { x, z, size: self.size });
        }
        self.store(x, z, value);
        Ok(())
    }

    fn store(&mut self, x: usize, z: usize, value: f64) {
        let idx = self.index(x, z);
        self.data[idx] = value;
        if value > self.max {
            self.max = value;
        }
        if value < self.min {
            self.min = value;
        }
    }

    /// Lowest value ever written (`+inf` before the first write).
    pub fn min_height(&self) -> f64 {
        self.min
    }

    /// Highest value ever written (`-inf` before the first write).
    pub fn max_height(&self) -> f64 {
        self.max
    }

    /// Running `(min, max)`, or `None` if nothing has been written yet.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        if self.min <= self.max {
            Some((self.min, self.max))
        } else {
            None
        }
    }

    /// Replace the running bounds with the true extremes of the current data.
    ///
    /// The running bounds go stale when an extreme cell is overwritten with an
    /// interior value. Nothing calls this implicitly.
    pub fn recompute_bounds(&mut self) {
        let (min, max) = self
            .data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)));
        self.min = min;
        self.max = max;
    }

    /// Raw row-major samples.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Iterate over all cells as `(x, z, height)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let size = self.size;
        self.data.iter().enumerate().map(move |(idx, &h)| (idx % size, idx / size, h))
    }
}
