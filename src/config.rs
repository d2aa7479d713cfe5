//! Construction-time terrain configuration.
//!
//! Every knob the synthesizer and mesh builder read lives here, so one value
//! can be loaded from JSON, tweaked from the command line and validated once
//! before any grid is touched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Terrain generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Samples per side; the grid is `grid_size x grid_size`.
    pub grid_size: usize,
    /// World-space extent the grid is stretched over on X and Z.
    pub terrain_size: f64,
    /// Noise/RNG seed. A random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Elevation ceiling every synthesis pass clamps to.
    pub amplitude: f64,
    /// Divisor applied to grid coordinates before sampling noise.
    pub frequency: f64,
    /// Octaves used by the plain octave-noise query.
    pub octaves: u32,
    /// Amplitude decay between fractal octaves.
    pub persistence: f64,

    // Diamond-square
    pub roughness: f64,
    pub dampener: f64,

    // Voronoi peaks
    pub peak_count: usize,
    pub peak_dropoff: f64,
    pub peak_falloff: f64,

    /// Cells whose current elevation is below this value are never rewritten.
    pub threshold: Option<f64>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid_size: 513,
            terrain_size: 800.0,
            seed: None,
            amplitude: 100.0,
            frequency: 8.0,
            octaves: 4,
            persistence: 0.5,
            roughness: 1.0,
            dampener: 6.9,
            peak_count: 5,
            peak_dropoff: 1.05,
            peak_falloff: 0.1,
            threshold: None,
        }
    }
}

impl TerrainConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The configured seed, or a freshly drawn one.
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::random())
    }

    /// Reject values that would make synthesis or meshing ill-defined.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 2 {
            return Err(invalid(format!("grid_size must be at least 2, got {}", self.grid_size)));
        }
        let cells = self.grid_size.checked_mul(self.grid_size);
        if cells.and_then(|n| u32::try_from(n).ok()).is_none() {
            return Err(invalid(format!("grid_size {} overflows 32-bit indices", self.grid_size)));
        }
        if !(self.terrain_size.is_finite() && self.terrain_size > 0.0) {
            return Err(invalid(format!("terrain_size must be positive, got {}", self.terrain_size)));
        }
        if !(self.amplitude.is_finite() && self.amplitude > 0.0) {
            return Err(invalid(format!("amplitude must be positive, got {}", self.amplitude)));
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(invalid(format!("frequency must be positive, got {}", self.frequency)));
        }
        if self.octaves == 0 {
            return Err(invalid("octaves must be at least 1".to_string()));
        }
        if !(self.persistence.is_finite() && self.persistence > 0.0) {
            return Err(invalid(format!("persistence must be positive, got {}", self.persistence)));
        }
        if !(self.roughness.is_finite() && self.roughness >= 0.0) {
            return Err(invalid(format!("roughness must be non-negative, got {}", self.roughness)));
        }
        if !(self.dampener.is_finite() && self.dampener > 0.0) {
            return Err(invalid(format!("dampener must be positive, got {}", self.dampener)));
        }
        if !self.peak_dropoff.is_finite() {
            return Err(invalid("peak_dropoff must be finite".to_string()));
        }
        if !(self.peak_falloff.is_finite() && self.peak_falloff >= 0.0) {
            return Err(invalid(format!("peak_falloff must be non-negative, got {}", self.peak_falloff)));
        }
        if let Some(threshold) = self.threshold {
            if threshold.is_nan() {
                return Err(invalid("threshold must be a number".to_string()));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> TerrainError {
    TerrainError::InvalidConfig(msg)
}
