//! Tests for the lacunarity curve orchestrator.

use super::*;
use crate::box_sizes::BoxSizeSpec;
use crate::error::{Axis, LacunarityError};
use crate::test_utils::*;
use crate::volume::BinaryVolume;

fn builder(spec: BoxSizeSpec, parallelism: Parallelism) -> LacunarityCurveBuilder {
  LacunarityCurveBuilder::new(
    CurveConfig::new()
      .with_box_sizes(spec)
      .with_parallelism(parallelism),
  )
}

// =============================================================================
// Reference examples
// =============================================================================

#[test]
fn test_all_ones_volume() {
  let volume = BinaryVolume::filled([4, 4, 4], 1.0).unwrap();
  let table = lacunarity(&volume, &BoxSizeSpec::All).unwrap();

  let sizes: Vec<usize> = table.iter().map(|row| row.box_size).collect();
  assert_eq!(sizes, vec![1, 2, 3, 4]);

  for row in &table {
    assert_eq!(row.variance_mass, 0.0, "r={}", row.box_size);
    assert_eq!(row.mean_mass, (row.box_size.pow(3)) as f64);
    assert_eq!(row.lacunarity, 1.0);
  }

  let normalized: Vec<f64> = table.iter().map(|row| row.normalized_lacunarity).collect();
  assert_eq!(normalized, vec![1.0, 0.0, 0.0, 0.0]);

  // Every slope touches a zero normalized value, so H(r) is undefined throughout
  assert!(table.iter().all(|row| row.h_r.is_nan()));
}

#[test]
fn test_fractional_homogeneous_volume_has_zero_variance() {
  let volume = BinaryVolume::filled([32, 32, 32], 0.1).unwrap();
  let table = lacunarity(&volume, &BoxSizeSpec::list([1, 2, 5, 13, 32])).unwrap();

  for row in &table {
    assert_eq!(row.variance_mass, 0.0, "r={}", row.box_size);
    assert_eq!(row.lacunarity, 1.0, "r={}", row.box_size);
  }
  assert_eq!(table.rows()[0].mean_mass, 0.1);
}

#[test]
fn test_fractional_checkerboard_unit_box() {
  let volume = BinaryVolume::from_fn([32, 32, 32], |i, j, k| 0.3 * ((i + j + k) % 2) as f64).unwrap();
  let table = lacunarity(&volume, &BoxSizeSpec::list([1, 2])).unwrap();

  assert_close(table.rows()[0].mean_mass, 0.15, 1e-13);
  assert_close(table.rows()[0].lacunarity, 2.0, 1e-13);
  // Every 2³ window holds four 0.3 cells
  assert_eq!(table.rows()[1].variance_mass, 0.0);
}

#[test]
fn test_unit_box_lacunarity_is_inverse_occupancy() {
  for (seed, density) in [(1, 0.1), (2, 0.35), (3, 0.8)] {
    let volume = random_binary([10, 9, 8], density, seed);
    let p = volume.occupancy();
    let table = lacunarity(&volume, &BoxSizeSpec::list([1, 3])).unwrap();

    assert_close(table.rows()[0].lacunarity, 1.0 / p, 1e-12);
  }
}

#[test]
fn test_unit_box_matches_raw_cell_statistics() {
  let volume = random_counts([7, 8, 9], 12, 4);
  let table = lacunarity(&volume, &BoxSizeSpec::list([1])).unwrap();
  let row = table.row(1).unwrap();

  let (mean, var) = two_pass_stats(volume.as_slice());
  assert_close(row.mean_mass, mean, 1e-12);
  assert_close(row.variance_mass, var, 1e-12);
  assert_close(row.lacunarity, 1.0 + var / (mean * mean), 1e-12);
}

#[test]
fn test_single_corner_cube() {
  // 2³ solid block in a 4³ volume: Λ(1) = 64 / 8
  let volume = corner_cube([4, 4, 4], 2);
  let table = lacunarity(&volume, &BoxSizeSpec::All).unwrap();
  assert_close(table.row(1).unwrap().lacunarity, 8.0, 1e-12);

  // One window at r = 4
  let last = table.row(4).unwrap();
  assert_eq!(last.variance_mass, 0.0);
  assert_eq!(last.lacunarity, 1.0);
  assert_eq!(last.normalized_lacunarity, 0.0);
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_lacunarity_at_least_one_and_normalized_starts_at_one() {
  for seed in 0..6 {
    let volume = random_counts([12, 10, 11], 3, seed);
    let spec = if seed % 2 == 0 {
      BoxSizeSpec::All
    } else {
      BoxSizeSpec::list([3, 5, 7, 10])
    };
    let table = lacunarity(&volume, &spec).unwrap();

    assert_eq!(table.rows()[0].normalized_lacunarity, 1.0);
    for row in &table {
      assert!(row.lacunarity >= 1.0, "seed {seed} r={}", row.box_size);
      assert!(row.variance_mass >= 0.0);
      assert!(row.normalized_lacunarity >= 0.0);
    }
  }
}

#[test]
fn test_rows_ascending_for_unsorted_request() {
  let volume = random_binary([8, 8, 8], 0.4, 7);
  let table = lacunarity(&volume, &BoxSizeSpec::list([6, 2, 4, 2, 1])).unwrap();

  let sizes: Vec<usize> = table.iter().map(|row| row.box_size).collect();
  assert_eq!(sizes, vec![1, 2, 4, 6]);
  assert_eq!(table.len(), 4);
  assert!(table.row(3).is_none());
  assert_eq!(table.dimensions(), [8, 8, 8]);
}

#[test]
fn test_normalized_reference_is_smallest_requested() {
  let volume = random_binary([9, 9, 9], 0.3, 17);
  let full = lacunarity(&volume, &BoxSizeSpec::All).unwrap();
  let partial = lacunarity(&volume, &BoxSizeSpec::list([2, 5])).unwrap();

  let l2 = full.row(2).unwrap().lacunarity;
  let l5 = full.row(5).unwrap().lacunarity;
  assert_eq!(partial.row(2).unwrap().normalized_lacunarity, 1.0);
  assert_close(
    partial.row(5).unwrap().normalized_lacunarity,
    l5.ln() / l2.ln(),
    1e-12,
  );
}

#[test]
fn test_normalized_decays_for_random_volume() {
  let volume = random_binary([16, 16, 16], 0.25, 99);
  let table = lacunarity(&volume, &BoxSizeSpec::powers_of_two()).unwrap();

  let normalized: Vec<f64> = table.iter().map(|row| row.normalized_lacunarity).collect();
  for pair in normalized.windows(2) {
    assert!(pair[1] < pair[0], "{normalized:?}");
  }
}

#[test]
fn test_h_r_within_unit_interval() {
  let volume = random_binary([16, 16, 16], 0.3, 5);
  let table = lacunarity(&volume, &BoxSizeSpec::All).unwrap();

  // r = 15 borrows its slope from the single-window scale r = 16
  for row in &table {
    if row.box_size < 15 {
      assert!((0.0..=1.0).contains(&row.h_r), "r={} h={}", row.box_size, row.h_r);
    }
  }
}

// =============================================================================
// Determinism
// =============================================================================

fn table_bits(table: &LacunarityTable) -> Vec<u64> {
  table
    .iter()
    .flat_map(|row| {
      [
        row.box_size as u64,
        row.mean_mass.to_bits(),
        row.variance_mass.to_bits(),
        row.lacunarity.to_bits(),
        row.normalized_lacunarity.to_bits(),
        row.h_r.to_bits(),
      ]
    })
    .collect()
}

#[test]
fn test_repeated_runs_are_bit_identical() {
  let volume = random_counts([14, 13, 12], 5, 31);
  let b = builder(BoxSizeSpec::All, Parallelism::Rayon);

  let first = table_bits(&b.build(&volume).unwrap());
  for _ in 0..3 {
    assert_eq!(table_bits(&b.build(&volume).unwrap()), first);
  }
}

#[test]
fn test_sequential_and_rayon_are_bit_identical() {
  let volume = random_counts([15, 12, 13], 4, 8);
  let seq = builder(BoxSizeSpec::All, Parallelism::Sequential)
    .build(&volume)
    .unwrap();
  let par = builder(BoxSizeSpec::All, Parallelism::Rayon)
    .build(&volume)
    .unwrap();

  assert_eq!(table_bits(&seq), table_bits(&par));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_box_size_too_large() {
  let volume = BinaryVolume::filled([4, 4, 4], 1.0).unwrap();
  let err = lacunarity(&volume, &BoxSizeSpec::list([5])).unwrap_err();
  assert_eq!(err, LacunarityError::InvalidBoxSize { box_size: 5, max: 4 });
}

#[test]
fn test_zero_axis_volume() {
  let err = BinaryVolume::filled([4, 0, 4], 1.0).unwrap_err();
  assert!(matches!(
    err,
    LacunarityError::InvalidDimension { axis: Axis::Y, .. }
  ));
}

#[test]
fn test_empty_volume() {
  let volume = BinaryVolume::filled([3, 3, 3], 0.0).unwrap();
  let err = lacunarity(&volume, &BoxSizeSpec::All).unwrap_err();
  assert_eq!(err, LacunarityError::EmptyVolume);
}

// =============================================================================
// Extension points
// =============================================================================

#[test]
fn test_custom_hurst_does_not_touch_lacunarity() {
  let volume = random_binary([8, 8, 8], 0.5, 12);
  let default = lacunarity(&volume, &BoxSizeSpec::All).unwrap();
  let custom = LacunarityCurveBuilder::default()
    .with_hurst(|sizes: &[usize], _: &[f64]| vec![0.5; sizes.len()])
    .build(&volume)
    .unwrap();

  for (a, b) in default.iter().zip(&custom) {
    assert_eq!(a.lacunarity, b.lacunarity);
    assert_eq!(a.normalized_lacunarity, b.normalized_lacunarity);
    assert_eq!(b.h_r, 0.5);
  }
}

#[test]
fn test_build_timed_counts_windows() {
  let volume = random_binary([5, 6, 7], 0.5, 3);
  let builder = builder(BoxSizeSpec::list([1, 2, 5]), Parallelism::Rayon);
  let (table, stats) = builder.build_timed(&volume).unwrap();

  let expected: u64 = [1usize, 2, 5]
    .iter()
    .map(|&r| ((5 - r + 1) * (6 - r + 1) * (7 - r + 1)) as u64)
    .sum();
  assert_eq!(table.len(), 3);
  assert_eq!(stats.box_size_count, 3);
  assert_eq!(stats.window_count, expected);
  assert!(stats.total_us >= stats.prefix_build_us);
}

#[test]
fn test_normalize_edge_cases() {
  assert!(normalize(&[]).is_empty());
  assert_eq!(normalize(&[3.0]), vec![1.0]);
  // No heterogeneity at the reference scale
  assert_eq!(normalize(&[1.0, 1.5, 1.0]), vec![1.0, 0.0, 0.0]);
  assert_close(normalize(&[4.0, 2.0])[1], 0.5, 1e-12);
}
