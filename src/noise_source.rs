//! Seeded coherent noise for terrain synthesis.

use noise::{NoiseFn, Perlin};

use crate::error::{Result, TerrainError};

/// Seeded Perlin noise sampled on grid coordinates.
///
/// Grid coordinates are divided by `frequency` before hitting the noise
/// lattice, so larger frequencies give broader features. Output for a given
/// seed and query is fully deterministic.
#[derive(Clone, Debug)]
pub struct NoiseSource {
    seed: u32,
    frequency: f64,
    octaves: u32,
    perlin: Perlin,
}

impl NoiseSource {
    pub fn new(seed: u64, frequency: f64, octaves: u32) -> Result<Self> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(TerrainError::InvalidConfig(format!(
                "noise frequency must be positive, got {}",
                frequency
            )));
        }
        if octaves == 0 {
            return Err(TerrainError::InvalidConfig("noise needs at least one octave".to_string()));
        }
        let seed = seed as u32;
        Ok(Self {
            seed,
            frequency,
            octaves,
            perlin: Perlin::new(seed),
        })
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Single-octave noise in `[-1, 1]`.
    pub fn noise(&self, x: f64, z: f64) -> f64 {
        self.perlin
            .get([x / self.frequency, z / self.frequency])
            .clamp(-1.0, 1.0)
    }

    /// Single-octave noise remapped to `[0, 1]`.
    pub fn noise01(&self, x: f64, z: f64) -> f64 {
        (self.noise(x, z) + 1.0) * 0.5
    }

    /// Noise summed over the configured octave count, halving amplitude and
    /// doubling detail each octave. Normalized to `[-1, 1]`.
    pub fn octave_noise(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut scale = 1.0;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;

        for _ in 0..self.octaves {
            total += self.noise(x * scale, z * scale) * amplitude;
            max_value += amplitude;
            amplitude *= 0.5;
            scale *= 2.0;
        }

        (total / max_value).clamp(-1.0, 1.0)
    }

    /// Fractal Brownian motion in `[0, 1]`.
    ///
    /// Octave `i` samples at `(x / 2^i, z / 2^i)` with weight `persistence^i`;
    /// the sum is divided by the total weight so the range does not depend on
    /// `octaves`. Returns `0.0` for zero octaves.
    pub fn fractal(&self, x: f64, z: f64, octaves: u32, persistence: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.noise01(x / frequency, z / frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        (total / max_value).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(NoiseSource::new(1, 0.0, 4).is_err());
        assert!(NoiseSource::new(1, -8.0, 4).is_err());
        assert!(NoiseSource::new(1, f64::NAN, 4).is_err());
        assert!(NoiseSource::new(1, 8.0, 0).is_err());
    }

    #[test]
    fn test_same_seed_same_noise() {
        let a = NoiseSource::new(42, 8.0, 4).unwrap();
        let b = NoiseSource::new(42, 8.0, 4).unwrap();
        for i in 0..50 {
            let (x, z) = (i as f64 * 1.7, i as f64 * 0.3 + 5.0);
            assert_eq!(a.noise(x, z), b.noise(x, z));
            assert_eq!(a.octave_noise(x, z), b.octave_noise(x, z));
            assert_eq!(a.fractal(x, z, 6, 0.5), b.fractal(x, z, 6, 0.5));
        }
    }

    #[test]
    fn test_noise_ranges() {
        let source = NoiseSource::new(7, 8.0, 6).unwrap();
        for z in 0..40 {
            for x in 0..40 {
                let (x, z) = (x as f64 * 1.3, z as f64 * 0.9);
                let n = source.noise(x, z);
                assert!((-1.0..=1.0).contains(&n));
                assert!((0.0..=1.0).contains(&source.noise01(x, z)));
                let o = source.octave_noise(x, z);
                assert!((-1.0..=1.0).contains(&o));
            }
        }
    }

    #[test]
    fn test_fractal_bounded_for_any_octave_count() {
        let source = NoiseSource::new(99, 8.0, 4).unwrap();
        for octaves in [1u32, 4, 8, 16] {
            for persistence in [0.5, 1.0, 2.52] {
                for z in 0..20 {
                    for x in 0..20 {
                        let v = source.fractal(x as f64 * 3.0, z as f64 * 3.0, octaves, persistence);
                        assert!(
                            (0.0..=1.0).contains(&v),
                            "fractal({}, {}) = {} with {} octaves",
                            x, z, v, octaves
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_single_octave_fractal_is_noise01() {
        let source = NoiseSource::new(5, 8.0, 4).unwrap();
        for x in 0..10 {
            let x = x as f64 * 2.5;
            assert_eq!(source.fractal(x, 3.0, 1, 0.5), source.noise01(x, 3.0));
        }
    }

    #[test]
    fn test_zero_octaves_is_zero() {
        let source = NoiseSource::new(5, 8.0, 4).unwrap();
        assert_eq!(source.fractal(1.0, 2.0, 0, 0.5), 0.0);
    }
}
