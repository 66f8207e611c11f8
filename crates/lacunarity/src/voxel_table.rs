//! Sparse voxel table → dense [`BinaryVolume`].
//!
//! A voxel table lists occupied cells as `(x, y, z, count)` rows, typically
//! produced by voxelizing a point cloud upstream.

use crate::error::{Axis, LacunarityError, Result};
use crate::volume::{cell_count, BinaryVolume, Dimensions};

/// One row of a voxel table.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelCount {
  pub x: usize,
  pub y: usize,
  pub z: usize,
  pub count: f64,
}

impl VoxelCount {
  pub fn new(x: usize, y: usize, z: usize, count: f64) -> Self {
    Self { x, y, z, count }
  }
}

/// How accumulated counts become cell values.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Occupancy {
  /// Keep the accumulated count.
  #[default]
  Counts,
  /// 1 where the count is positive and at least the threshold, else 0.
  Threshold(f64),
}

impl Occupancy {
  #[inline]
  fn apply(self, count: f64) -> f64 {
    match self {
      Occupancy::Counts => count,
      Occupancy::Threshold(t) => {
        if count > 0.0 && count >= t {
          1.0
        } else {
          0.0
        }
      }
    }
  }
}

/// `max coordinate + 1` per axis.
fn inferred_dimensions(voxels: &[VoxelCount]) -> Result<Dimensions> {
  let mut dimensions = [0usize; 3];
  for voxel in voxels {
    for ((axis, slot), coordinate) in Axis::ALL
      .iter()
      .zip(dimensions.iter_mut())
      .zip([voxel.x, voxel.y, voxel.z])
    {
      let len = coordinate
        .checked_add(1)
        .ok_or(LacunarityError::CoordinateOverflow {
          axis: *axis,
          coordinate,
        })?;
      *slot = (*slot).max(len);
    }
  }
  Ok(dimensions)
}

impl BinaryVolume {
  /// Densify a voxel table.
  ///
  /// With `dimensions = None` each axis spans `max coordinate + 1`. Rows
  /// sharing a coordinate accumulate before `occupancy` is applied.
  pub fn from_voxel_table(
    dimensions: Option<Dimensions>,
    voxels: &[VoxelCount],
    occupancy: Occupancy,
  ) -> Result<Self> {
    let dimensions = match dimensions {
      Some(dims) => dims,
      None => inferred_dimensions(voxels)?,
    };
    let [nx, ny, nz] = dimensions;
    let mut data = vec![0.0f64; cell_count(dimensions)?];
    for voxel in voxels {
      if voxel.x >= nx || voxel.y >= ny || voxel.z >= nz {
        return Err(LacunarityError::VoxelOutOfBounds {
          x: voxel.x,
          y: voxel.y,
          z: voxel.z,
          dimensions,
        });
      }
      let index = (voxel.x * ny + voxel.y) * nz + voxel.z;
      if !voxel.count.is_finite() || voxel.count < 0.0 {
        return Err(LacunarityError::InvalidCellValue {
          index,
          value: voxel.count,
        });
      }
      data[index] += voxel.count;
    }

    if occupancy != Occupancy::Counts {
      for cell in data.iter_mut() {
        *cell = occupancy.apply(*cell);
      }
    }

    BinaryVolume::new(dimensions, data)
  }
}

#[cfg(test)]
#[path = "voxel_table_test.rs"]
mod voxel_table_test;
