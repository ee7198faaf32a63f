// crates/engine_heightmap/src/lib.rs
//
// Height-sample provider for the terrain generator. Produces a row-major
// grid of elevations from seeded value noise, so terrain generation is
// deterministic and reproducible without baking files to disk.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A rectangular grid of scalar elevations, row-major.
///
/// The sample for grid cell `(x, z)` lives at flat index `z * width + x`.
/// Consumers (the terrain generator) hold this by shared reference and never
/// copy the samples.
#[derive(Clone, Debug)]
pub struct HeightMap {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl HeightMap {
    /// Wraps an externally produced sample grid.
    ///
    /// Returns `None` if the sample count does not match `width * height`.
    pub fn from_samples(width: u32, height: u32, samples: Vec<f32>) -> Option<Self> {
        if samples.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            samples,
        })
    }

    /// A grid where every sample has the same elevation. Mostly useful for
    /// tests and for water-only scenes that still want a sea floor.
    pub fn flat(width: u32, height: u32, elevation: f32) -> Self {
        Self {
            width,
            height,
            samples: vec![elevation; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Elevation at grid cell `(x, z)`.
    pub fn sample(&self, x: u32, z: u32) -> f32 {
        self.samples[(z as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Settings for fractal value-noise synthesis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NoiseSettings {
    pub seed: u32,
    /// Base spatial frequency in cells.
    pub frequency: f32,
    /// Output amplitude of the first octave.
    pub amplitude: f32,
    pub octaves: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            frequency: 1.0 / 32.0,
            amplitude: 8.0,
            octaves: 3,
        }
    }
}

/// Builds a [`HeightMap`] from fractal value noise.
///
/// Rows are independent, so synthesis is parallelized over them.
pub struct HeightMapBuilder {
    settings: NoiseSettings,
}

impl HeightMapBuilder {
    pub fn new(settings: NoiseSettings) -> Self {
        Self { settings }
    }

    pub fn build(&self, width: u32, height: u32) -> HeightMap {
        let s = self.settings;
        let w = width as usize;

        let samples: Vec<f32> = (0..height as usize)
            .into_par_iter()
            .flat_map_iter(|z| {
                (0..w).map(move |x| fbm(x as f32, z as f32, s))
            })
            .collect();

        HeightMap {
            width,
            height,
            samples,
        }
    }
}

/// Fractal sum of value noise: each octave doubles frequency and halves
/// amplitude, normalized so the output stays within +-amplitude.
fn fbm(x: f32, z: f32, s: NoiseSettings) -> f32 {
    let mut total = 0.0;
    let mut norm = 0.0;
    let mut freq = s.frequency;
    let mut amp = 1.0;

    for octave in 0..s.octaves.max(1) {
        let seed = s.seed.wrapping_add(octave.wrapping_mul(0x9E37));
        total += amp * value_noise_2d(x * freq, z * freq, seed);
        norm += amp;
        freq *= 2.0;
        amp *= 0.5;
    }

    s.amplitude * total / norm
}

/// 2D value noise in [-1, 1], quintic-smoothed between lattice points.
fn value_noise_2d(x: f32, y: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let tx = x - xi as f32;
    let ty = y - yi as f32;

    // quintic smoothstep for C2 continuity
    let sx = tx * tx * tx * (tx * (tx * 6.0 - 15.0) + 10.0);
    let sy = ty * ty * ty * (ty * (ty * 6.0 - 15.0) + 10.0);

    let c00 = hash_lattice(xi, yi, seed);
    let c10 = hash_lattice(xi + 1, yi, seed);
    let c01 = hash_lattice(xi, yi + 1, seed);
    let c11 = hash_lattice(xi + 1, yi + 1, seed);

    let a = c00 * (1.0 - sx) + c10 * sx;
    let b = c01 * (1.0 - sx) + c11 * sx;
    ((a * (1.0 - sy) + b * sy) * 2.0) - 1.0
}

/// Integer lattice hash -> [0, 1).
fn hash_lattice(i: i32, j: i32, seed: u32) -> f32 {
    let mut x = (i as u64).wrapping_mul(0x27d4_eb2d);
    x ^= (j as u64).wrapping_mul(0x1656_6791_9e37_79f9);
    x ^= (seed as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    let u = x ^ (x >> 33);
    (u as f64 / (u64::MAX as f64)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic() {
        let a = value_noise_2d(12.34, -56.78, 42);
        let b = value_noise_2d(12.34, -56.78, 42);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn build_is_deterministic_across_runs() {
        let builder = HeightMapBuilder::new(NoiseSettings {
            seed: 7,
            ..Default::default()
        });
        let a = builder.build(64, 48);
        let b = builder.build(64, 48);
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn dimensions_and_addressing() {
        let map = HeightMap::from_samples(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        // Row-major: (x, z) -> z * width + x
        assert_eq!(map.sample(0, 0), 0.0);
        assert_eq!(map.sample(2, 0), 2.0);
        assert_eq!(map.sample(0, 1), 3.0);
        assert_eq!(map.sample(2, 1), 5.0);
    }

    #[test]
    fn from_samples_rejects_mismatched_grid() {
        assert!(HeightMap::from_samples(4, 4, vec![0.0; 15]).is_none());
    }

    #[test]
    fn amplitude_bounds_output() {
        let builder = HeightMapBuilder::new(NoiseSettings {
            seed: 99,
            amplitude: 8.0,
            ..Default::default()
        });
        let map = builder.build(128, 128);
        for &s in map.samples() {
            assert!(s.abs() <= 8.0 + 1e-4, "sample {} exceeds amplitude", s);
        }
    }
}
