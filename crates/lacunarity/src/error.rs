//! Error type shared by every stage of the lacunarity computation.
//!
//! All variants are input-validation failures raised before any window is
//! scanned. There is no retryable class: the computation is pure.

use thiserror::Error;

/// Axis label used in error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
  X,
  Y,
  Z,
}

impl Axis {
  pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl std::fmt::Display for Axis {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Axis::X => "x",
      Axis::Y => "y",
      Axis::Z => "z",
    };
    f.write_str(name)
  }
}

/// Errors emitted while building volumes, resolving scales, or scanning.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LacunarityError {
  #[error("invalid dimension: {axis} axis is zero in {dimensions:?}")]
  InvalidDimension { axis: Axis, dimensions: [usize; 3] },

  #[error("invalid box size {box_size}: must be within 1..={max}")]
  InvalidBoxSize { box_size: i64, max: usize },

  #[error("no box-mass samples at box size {box_size}")]
  EmptySample { box_size: usize },

  #[error("data length mismatch: dimensions {dimensions:?} need {expected} cells, got {actual}")]
  DataLengthMismatch {
    dimensions: [usize; 3],
    expected: usize,
    actual: usize,
  },

  #[error("invalid cell value {value} at index {index}: values must be finite and >= 0")]
  InvalidCellValue { index: usize, value: f64 },

  #[error("invalid box sizes {0:?}: expected \"all\", \"pow2\" or a list of integers")]
  InvalidBoxSizeSpec(String),

  #[error("volume has zero total mass; lacunarity is undefined")]
  EmptyVolume,

  #[error("volume too large: {dimensions:?} overflows the addressable cell count at the {axis} axis")]
  VolumeTooLarge { axis: Axis, dimensions: [usize; 3] },

  #[error("voxel coordinate {coordinate} on the {axis} axis cannot be sized")]
  CoordinateOverflow { axis: Axis, coordinate: usize },

  #[error("voxel ({x}, {y}, {z}) lies outside dimensions {dimensions:?}")]
  VoxelOutOfBounds {
    x: usize,
    y: usize,
    z: usize,
    dimensions: [usize; 3],
  },
}

pub type Result<T, E = LacunarityError> = std::result::Result<T, E>;
