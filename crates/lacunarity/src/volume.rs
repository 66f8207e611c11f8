//! Immutable 3D occupancy volume.
//!
//! # Memory Layout
//!
//! ```text
//! Volume memory layout (row-major, Z innermost):
//!
//! Address:  0        1       ...  nz-1      nz      ...
//! Content: [0,0,0] [0,0,1]  ...  [0,0,nz-1][0,1,0] ...
//!          └──────────── Z ──────────────┘
//!
//! index = (i * ny + j) * nz + k
//! ```
//!
//! Cell values are non-negative: an occupancy indicator (0/1) or a point
//! count. A cell is occupied when its value is greater than zero.

use crate::error::{Axis, LacunarityError, Result};

/// Volume dimensions `[nx, ny, nz]`.
pub type Dimensions = [usize; 3];

/// Immutable 3D grid of non-negative cell values.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryVolume {
  dimensions: Dimensions,
  data: Vec<f64>,
}

/// Fail with `InvalidDimension` on the first zero-length axis.
pub(crate) fn validate_dimensions(dimensions: Dimensions) -> Result<()> {
  for (axis, &len) in Axis::ALL.iter().zip(dimensions.iter()) {
    if len == 0 {
      return Err(LacunarityError::InvalidDimension {
        axis: *axis,
        dimensions,
      });
    }
  }
  Ok(())
}

/// Validated `nx * ny * nz`. Fails with `VolumeTooLarge` when the cells, or
/// the prefix-sum table built over them, cannot be addressed.
pub(crate) fn cell_count(dimensions: Dimensions) -> Result<usize> {
  validate_dimensions(dimensions)?;

  // Prefix-sum entries are at most 16 bytes and one larger per axis
  let max_entries = isize::MAX as usize / 16;
  let mut cells = 1usize;
  let mut entries = 1usize;
  for (axis, &len) in Axis::ALL.iter().zip(dimensions.iter()) {
    cells = match cells.checked_mul(len) {
      Some(n) => n,
      None => return Err(LacunarityError::VolumeTooLarge { axis: *axis, dimensions }),
    };
    entries = match len.checked_add(1).and_then(|n| entries.checked_mul(n)) {
      Some(n) if n <= max_entries => n,
      _ => return Err(LacunarityError::VolumeTooLarge { axis: *axis, dimensions }),
    };
  }
  Ok(cells)
}

impl BinaryVolume {
  /// Wrap `data` laid out as `(i * ny + j) * nz + k`.
  pub fn new(dimensions: Dimensions, data: Vec<f64>) -> Result<Self> {
    let expected = cell_count(dimensions)?;
    if data.len() != expected {
      return Err(LacunarityError::DataLengthMismatch {
        dimensions,
        expected,
        actual: data.len(),
      });
    }

    if let Some((index, &value)) = data
      .iter()
      .enumerate()
      .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
      return Err(LacunarityError::InvalidCellValue { index, value });
    }

    Ok(Self { dimensions, data })
  }

  /// Build a volume by evaluating `f(i, j, k)` for every cell.
  pub fn from_fn<F>(dimensions: Dimensions, mut f: F) -> Result<Self>
  where
    F: FnMut(usize, usize, usize) -> f64,
  {
    let mut data = Vec::with_capacity(cell_count(dimensions)?);
    let [nx, ny, nz] = dimensions;
    for i in 0..nx {
      for j in 0..ny {
        for k in 0..nz {
          data.push(f(i, j, k));
        }
      }
    }
    Self::new(dimensions, data)
  }

  /// A volume with every cell set to `value`.
  pub fn filled(dimensions: Dimensions, value: f64) -> Result<Self> {
    let len = cell_count(dimensions)?;
    Self::new(dimensions, vec![value; len])
  }

  #[inline]
  pub fn dimensions(&self) -> Dimensions {
    self.dimensions
  }

  /// Smallest axis length; the largest admissible box size.
  #[inline]
  pub fn min_dimension(&self) -> usize {
    self.dimensions.iter().copied().min().unwrap_or(0)
  }

  /// Linear index of `(i, j, k)`. Does not bounds-check.
  #[inline(always)]
  pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
    let [_, ny, nz] = self.dimensions;
    (i * ny + j) * nz + k
  }

  /// Cell value at `(i, j, k)`, or `None` outside the volume.
  #[inline]
  pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f64> {
    let [nx, ny, nz] = self.dimensions;
    if i < nx && j < ny && k < nz {
      Some(self.data[self.index(i, j, k)])
    } else {
      None
    }
  }

  #[inline]
  pub fn as_slice(&self) -> &[f64] {
    &self.data
  }

  /// Number of cells.
  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  /// Always false for a constructed volume; kept for API symmetry with `len`.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn total_mass(&self) -> f64 {
    self.data.iter().sum()
  }

  pub fn occupied_count(&self) -> usize {
    self.data.iter().filter(|&&v| v > 0.0).count()
  }

  /// Fraction of occupied cells, in [0, 1].
  pub fn occupancy(&self) -> f64 {
    self.occupied_count() as f64 / self.len() as f64
  }

  /// Extend each axis at its high end by `extension` zero-valued cells.
  pub fn padded(&self, extension: [usize; 3]) -> Result<Self> {
    let [nx, ny, nz] = self.dimensions;
    let mut dimensions = self.dimensions;
    for ((axis, slot), &extra) in Axis::ALL.iter().zip(dimensions.iter_mut()).zip(&extension) {
      *slot = match slot.checked_add(extra) {
        Some(n) => n,
        None => {
          return Err(LacunarityError::VolumeTooLarge {
            axis: *axis,
            dimensions: self.dimensions,
          })
        }
      };
    }
    let [_, pny, pnz] = dimensions;

    let mut data = vec![0.0; cell_count(dimensions)?];
    for i in 0..nx {
      for j in 0..ny {
        let src = self.index(i, j, 0);
        let dst = (i * pny + j) * pnz;
        data[dst..dst + nz].copy_from_slice(&self.data[src..src + nz]);
      }
    }

    Ok(Self { dimensions, data })
  }
}

#[cfg(test)]
#[path = "volume_test.rs"]
mod volume_test;
