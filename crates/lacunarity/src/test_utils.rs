//! Test utilities: fixture volumes shared across module tests.

use crate::volume::{BinaryVolume, Dimensions};

/// Cheap deterministic hash of a cell coordinate into `[0, 1)`.
pub fn cell_noise(i: usize, j: usize, k: usize, seed: u64) -> f64 {
  let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
  for v in [i as u64, j as u64, k as u64] {
    h ^= v.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = h.rotate_left(27).wrapping_mul(0x94D0_49BB_1331_11EB);
  }
  h ^= h >> 31;
  (h >> 11) as f64 / (1u64 << 53) as f64
}

/// 0/1 volume with roughly `density` of cells occupied.
pub fn random_binary(dimensions: Dimensions, density: f64, seed: u64) -> BinaryVolume {
  BinaryVolume::from_fn(dimensions, |i, j, k| {
    if cell_noise(i, j, k, seed) < density {
      1.0
    } else {
      0.0
    }
  })
  .unwrap()
}

/// Point-count volume with values in `0..=max_count`.
pub fn random_counts(dimensions: Dimensions, max_count: u32, seed: u64) -> BinaryVolume {
  BinaryVolume::from_fn(dimensions, |i, j, k| {
    (cell_noise(i, j, k, seed) * (max_count + 1) as f64).floor()
  })
  .unwrap()
}

/// 3D checkerboard of 0/1 cells.
pub fn checkerboard(dimensions: Dimensions) -> BinaryVolume {
  BinaryVolume::from_fn(dimensions, |i, j, k| ((i + j + k) % 2) as f64).unwrap()
}

/// Solid cube of ones with side `side` in the low corner, zeros elsewhere.
pub fn corner_cube(dimensions: Dimensions, side: usize) -> BinaryVolume {
  BinaryVolume::from_fn(dimensions, |i, j, k| {
    if i < side && j < side && k < side {
      1.0
    } else {
      0.0
    }
  })
  .unwrap()
}

/// Population mean and variance computed the textbook two-pass way.
pub fn two_pass_stats(values: &[f64]) -> (f64, f64) {
  let n = values.len() as f64;
  let mean = values.iter().sum::<f64>() / n;
  let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
  (mean, var)
}

pub fn assert_close(actual: f64, expected: f64, tol: f64) {
  let scale = expected.abs().max(1.0);
  assert!(
    (actual - expected).abs() <= tol * scale,
    "expected {expected}, got {actual} (tol {tol})"
  );
}
