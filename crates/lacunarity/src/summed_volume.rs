//! Summed-volume (3D prefix-sum) table.
//!
//! Entry `S[i][j][k]` holds the sum of all cells with coordinates strictly
//! below `(i, j, k)`. The table carries a zero leading plane on each axis, so
//! it has `(nx+1)(ny+1)(nz+1)` entries and no boundary special cases.
//!
//! ```text
//! window(i,j,k,r) =   S[i+r, j+r, k+r]
//!                   - S[i,   j+r, k+r] - S[i+r, j,   k+r] - S[i+r, j+r, k  ]
//!                   + S[i+r, j,   k  ] + S[i,   j+r, k  ] + S[i,   j,   k+r]
//!                   - S[i,   j,   k  ]
//! ```
//!
//! Cell corner indices (binary: ZYX):
//!   0 = (0,0,0)    4 = (0,0,1)
//!   1 = (1,0,0)    5 = (1,0,1)
//!   2 = (0,1,0)    6 = (0,1,1)
//!   3 = (1,1,0)    7 = (1,1,1)
//!
//! Integral volumes whose total stays well below 2^53 keep plain `f64` sums.
//! Other volumes are held as fixed-point `i128` in units of `2^-shift`, where
//! `shift` makes every cell an integer. Either way each window mass is the
//! correctly rounded value of its exact sum: a unit window returns the cell
//! itself and equal windows return equal masses. Only cell values spanning
//! more than ~125 bits of dynamic range fall back to rounded `f64` sums.

use std::ops::{Add, AddAssign, Sub};

use crate::volume::{BinaryVolume, Dimensions};

/// Magnitude bits an `f64` sum may use before integer arithmetic stops being
/// exact, less two bits of headroom for the corner combination.
const FLOAT_EXACT_BITS: i32 = 51;

/// Same bound for the `i128` fixed-point table.
const FIXED_EXACT_BITS: i32 = 125;

/// Prefix-sum storage.
#[derive(Clone, Debug)]
enum Sums {
  Float(Vec<f64>),
  Fixed { sums: Vec<i128>, unit: f64 },
}

/// Immutable prefix-sum table built once per volume.
#[derive(Clone, Debug)]
pub struct SummedVolumeTable {
  /// Dimensions of the source volume (not of the table).
  dimensions: Dimensions,
  /// Stride of one step along X in `sums`.
  x_stride: usize,
  /// Stride of one step along Y in `sums`.
  y_stride: usize,
  sums: Sums,
}

/// `value = mantissa * 2^exponent` with an odd mantissa; `None` for zero.
fn decompose(value: f64) -> Option<(u64, i32)> {
  if value == 0.0 {
    return None;
  }
  let bits = value.to_bits();
  let biased = ((bits >> 52) & 0x7ff) as i32;
  let fraction = bits & ((1u64 << 52) - 1);
  let (mantissa, exponent) = if biased == 0 {
    (fraction, -1074)
  } else {
    (fraction | (1u64 << 52), biased - 1075)
  };
  let trailing = mantissa.trailing_zeros();
  Some((mantissa >> trailing, exponent + trailing as i32))
}

/// Fixed-point shift that keeps every partial sum of `cells` exact, or
/// `None` when plain `f64` sums are already exact (or nothing fits).
fn fixed_point_shift(cells: &[f64]) -> Option<u32> {
  let mut lowest = i32::MAX;
  let mut highest = i32::MIN;
  for &value in cells {
    if let Some((mantissa, exponent)) = decompose(value) {
      lowest = lowest.min(exponent);
      highest = highest.max(exponent + (64 - mantissa.leading_zeros()) as i32);
    }
  }
  if highest == i32::MIN {
    return None;
  }

  let shift = (-lowest).max(0);
  let count_bits = cells.len().next_power_of_two().trailing_zeros() as i32;
  let total_bits = highest + shift + count_bits;
  if shift == 0 && total_bits <= FLOAT_EXACT_BITS {
    None
  } else if total_bits <= FIXED_EXACT_BITS && shift <= 1022 {
    Some(shift as u32)
  } else {
    #[cfg(feature = "tracing")]
    tracing::warn!(total_bits, shift, "cell values exceed fixed-point range, using f64 sums");
    None
  }
}

/// Copy the cells behind the zero leading planes and run the three
/// cumulative passes.
fn prefix_sums<T, F>(volume: &BinaryVolume, x_stride: usize, y_stride: usize, convert: F) -> Vec<T>
where
  T: Copy + Default + AddAssign,
  F: Fn(f64) -> T,
{
  let [nx, ny, nz] = volume.dimensions();
  let (sx, sy, sz) = (nx + 1, ny + 1, nz + 1);

  let mut sums = vec![T::default(); sx * sy * sz];
  let cells = volume.as_slice();
  for i in 0..nx {
    for j in 0..ny {
      let src = volume.index(i, j, 0);
      let dst = (i + 1) * x_stride + (j + 1) * y_stride + 1;
      for (slot, &value) in sums[dst..dst + nz].iter_mut().zip(&cells[src..src + nz]) {
        *slot = convert(value);
      }
    }
  }

  // Z pass
  for i in 1..sx {
    for j in 1..sy {
      let row = i * x_stride + j * y_stride;
      for k in 1..sz {
        let prev = sums[row + k - 1];
        sums[row + k] += prev;
      }
    }
  }

  // Y pass
  for i in 1..sx {
    for j in 1..sy {
      let row = i * x_stride + j * y_stride;
      let prev = row - y_stride;
      for k in 1..sz {
        let above = sums[prev + k];
        sums[row + k] += above;
      }
    }
  }

  // X pass
  for i in 1..sx {
    let plane = i * x_stride;
    let prev = plane - x_stride;
    for offset in y_stride..x_stride {
      let behind = sums[prev + offset];
      sums[plane + offset] += behind;
    }
  }

  sums
}

/// Signed sum of the eight corners, `+` where an odd number of corner bits
/// is set.
#[inline(always)]
fn inclusion_exclusion<T>(s: &[T], base: usize, offsets: &[usize; 8]) -> T
where
  T: Copy + Add<Output = T> + Sub<Output = T>,
{
  (s[base + offsets[7]] - s[base + offsets[6]] - s[base + offsets[5]] - s[base + offsets[3]])
    + (s[base + offsets[4]] + s[base + offsets[2]] + s[base + offsets[1]] - s[base + offsets[0]])
}

impl SummedVolumeTable {
  /// Build the table in O(nx·ny·nz) with three cumulative passes.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "summed_volume::build"))]
  pub fn build(volume: &BinaryVolume) -> Self {
    let dimensions = volume.dimensions();
    let [_, ny, nz] = dimensions;
    let y_stride = nz + 1;
    let x_stride = (ny + 1) * y_stride;

    let sums = match fixed_point_shift(volume.as_slice()) {
      None => Sums::Float(prefix_sums(volume, x_stride, y_stride, |v| v)),
      Some(shift) => Sums::Fixed {
        sums: prefix_sums(volume, x_stride, y_stride, |v| match decompose(v) {
          // exponent + shift is within 0..=FIXED_EXACT_BITS
          Some((mantissa, exponent)) => (mantissa as i128) << (exponent + shift as i32),
          None => 0,
        }),
        unit: 2f64.powi(-(shift as i32)),
      },
    };

    Self {
      dimensions,
      x_stride,
      y_stride,
      sums,
    }
  }

  #[inline]
  pub fn dimensions(&self) -> Dimensions {
    self.dimensions
  }

  /// Index of table entry `(i, j, k)`, each in `0..=n`.
  #[inline(always)]
  pub fn table_index(&self, i: usize, j: usize, k: usize) -> usize {
    i * self.x_stride + j * self.y_stride + k
  }

  /// Table offsets of the 8 corners of an `r`-sided window, relative to the
  /// window origin, in corner-index order.
  #[inline]
  pub fn corner_offsets(&self, r: usize) -> [usize; 8] {
    let dx = r * self.x_stride;
    let dy = r * self.y_stride;
    let dz = r;
    [
      0,
      dx,
      dy,
      dx + dy,
      dz,
      dx + dz,
      dy + dz,
      dx + dy + dz,
    ]
  }

  /// Sum over the eight corners at `base` using precomputed offsets.
  #[inline(always)]
  pub(crate) fn corner_sum(&self, base: usize, offsets: &[usize; 8]) -> f64 {
    match &self.sums {
      Sums::Float(sums) => inclusion_exclusion(sums, base, offsets),
      Sums::Fixed { sums, unit } => inclusion_exclusion(sums, base, offsets) as f64 * unit,
    }
  }

  /// Mass of the `r`-sided cubic window anchored at `origin`.
  ///
  /// The window must lie fully inside the volume.
  #[inline]
  pub fn window_sum(&self, origin: [usize; 3], r: usize) -> f64 {
    let base = self.table_index(origin[0], origin[1], origin[2]);
    self.corner_sum(base, &self.corner_offsets(r))
  }

  /// Sum over the half-open box `min..max` (per axis).
  pub fn region_sum(&self, min: [usize; 3], max: [usize; 3]) -> f64 {
    let mut corners = [0usize; 8];
    for (c, slot) in corners.iter_mut().enumerate() {
      let pick = |bit: usize, axis: usize| if c & bit != 0 { max[axis] } else { min[axis] };
      *slot = self.table_index(pick(1, 0), pick(2, 1), pick(4, 2));
    }
    self.corner_sum(0, &corners)
  }

  /// Sum of the whole volume.
  pub fn total(&self) -> f64 {
    let [nx, ny, nz] = self.dimensions;
    let index = self.table_index(nx, ny, nz);
    match &self.sums {
      Sums::Float(sums) => sums[index],
      Sums::Fixed { sums, unit } => sums[index] as f64 * unit,
    }
  }

  /// True when sums are held as fixed-point integers.
  pub fn is_fixed_point(&self) -> bool {
    matches!(self.sums, Sums::Fixed { .. })
  }

  /// Memory held by the table in bytes.
  pub fn size_bytes(&self) -> usize {
    match &self.sums {
      Sums::Float(sums) => sums.len() * std::mem::size_of::<f64>(),
      Sums::Fixed { sums, .. } => sums.len() * std::mem::size_of::<i128>(),
    }
  }
}

/// O(r³) window mass straight from the cells. Reference for tests and
/// benchmarks.
pub fn naive_window_sum(volume: &BinaryVolume, origin: [usize; 3], r: usize) -> f64 {
  let cells = volume.as_slice();
  let mut sum = 0.0;
  for i in origin[0]..origin[0] + r {
    for j in origin[1]..origin[1] + r {
      let row = volume.index(i, j, origin[2]);
      sum += cells[row..row + r].iter().sum::<f64>();
    }
  }
  sum
}

#[cfg(test)]
#[path = "summed_volume_test.rs"]
mod summed_volume_test;
