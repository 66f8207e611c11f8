//! Gliding-box scan for a single box size.
//!
//! Visits every fully-inside `r³` window with unit stride along each axis. No
//! wraparound and no partial boxes at the boundary. Each window mass is read
//! from the shared [`SummedVolumeTable`] in O(1).
//!
//! ```text
//!   X planes:  i = 0 ──────────────────────────► nx - r
//!              │ plane i: (ny - r + 1) × (nz - r + 1) windows
//!              ▼
//!         MassStatistics per plane ──► merged in plane order
//! ```
//!
//! Folding per plane and merging in a fixed order keeps the sequential and
//! the rayon path bit-identical.

use rayon::prelude::*;

use crate::error::{LacunarityError, Result};
use crate::statistics::MassStatistics;
use crate::summed_volume::SummedVolumeTable;

/// Scanner over all window positions for one box size.
#[derive(Clone, Debug)]
pub struct GlidingBoxScanner<'a> {
  table: &'a SummedVolumeTable,
  box_size: usize,
  /// Number of window origins along each axis.
  positions: [usize; 3],
  offsets: [usize; 8],
}

impl<'a> GlidingBoxScanner<'a> {
  /// Fails with `InvalidBoxSize` unless `1 <= box_size <= min dimension`.
  pub fn new(table: &'a SummedVolumeTable, box_size: usize) -> Result<Self> {
    let dims = table.dimensions();
    let max = dims.iter().copied().min().unwrap_or(0);
    if box_size == 0 || box_size > max {
      return Err(LacunarityError::InvalidBoxSize {
        box_size: box_size as i64,
        max,
      });
    }

    let positions = [
      dims[0] - box_size + 1,
      dims[1] - box_size + 1,
      dims[2] - box_size + 1,
    ];

    Ok(Self {
      table,
      box_size,
      positions,
      offsets: table.corner_offsets(box_size),
    })
  }

  #[inline]
  pub fn box_size(&self) -> usize {
    self.box_size
  }

  /// Window origins per axis: `n - r + 1`.
  #[inline]
  pub fn positions(&self) -> [usize; 3] {
    self.positions
  }

  /// `(nx-r+1)(ny-r+1)(nz-r+1)`.
  #[inline]
  pub fn sample_count(&self) -> usize {
    self.positions.iter().product()
  }

  /// Masses of all windows whose origin lies in X plane `i`. Empty when `i`
  /// is not below `positions()[0]`.
  pub fn plane_masses(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
    let [px, py, pz] = self.positions;
    let py = if i < px { py } else { 0 };
    (0..py).flat_map(move |j| {
      let row = self.table.table_index(i, j, 0);
      (0..pz).map(move |k| self.table.corner_sum(row + k, &self.offsets))
    })
  }

  /// Every window mass, X plane by X plane.
  pub fn masses(&self) -> impl Iterator<Item = f64> + '_ {
    (0..self.positions[0]).flat_map(move |i| self.plane_masses(i))
  }

  /// Accumulate one X plane.
  pub fn plane_statistics(&self, i: usize) -> MassStatistics {
    self.plane_masses(i).collect()
  }

  /// Accumulate every window, one plane at a time on the calling thread.
  pub fn statistics(&self) -> MassStatistics {
    let mut total = MassStatistics::new();
    for i in 0..self.positions[0] {
      total.merge(&self.plane_statistics(i));
    }
    total
  }

  /// Same result as [`statistics`](Self::statistics), planes folded in
  /// parallel via rayon.
  pub fn par_statistics(&self) -> MassStatistics {
    let planes: Vec<MassStatistics> = (0..self.positions[0])
      .into_par_iter()
      .map(|i| self.plane_statistics(i))
      .collect();

    let mut total = MassStatistics::new();
    for plane in &planes {
      total.merge(plane);
    }
    total
  }
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod scanner_test;
