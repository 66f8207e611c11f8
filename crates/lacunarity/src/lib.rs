//! lacunarity - Multi-scale gliding-box lacunarity for 3D occupancy volumes
//!
//! Computes, for a set of box sizes `r`, the box-mass mean and variance of
//! every fully-inside `r³` window, then raw lacunarity Λ(r), normalized
//! lacunarity and a Hurst-like exponent H(r).
//!
//! # Features
//!
//! - **Summed-volume table**: built once per volume, O(1) window mass via
//!   eight-corner inclusion-exclusion, shared read-only across scales
//! - **Stable statistics**: Welford running mean/variance, pairwise merge
//! - **Parallel scales**: rayon over box sizes and X planes, bit-identical to
//!   the sequential path
//! - **Swappable H(r)**: the Hurst transform sits behind a trait
//!
//! # Example
//!
//! ```ignore
//! use lacunarity::{lacunarity, BinaryVolume, BoxSizeSpec};
//!
//! let volume = BinaryVolume::filled([4, 4, 4], 1.0)?;
//! let table = lacunarity(&volume, &BoxSizeSpec::All)?;
//!
//! for row in &table {
//!     println!("{} {} {}", row.box_size, row.lacunarity, row.normalized_lacunarity);
//! }
//! ```

pub mod error;
pub use error::{Axis, LacunarityError, Result};

// Input volume and its collaborator conversions
pub mod volume;
pub mod voxel_table;
pub use volume::{BinaryVolume, Dimensions};
pub use voxel_table::{Occupancy, VoxelCount};

// Scale selection
pub mod box_sizes;
pub use box_sizes::{BoxSizeSet, BoxSizeSpec};

// Scanning kernel
pub mod scanner;
pub mod statistics;
pub mod summed_volume;
pub use scanner::GlidingBoxScanner;
pub use statistics::{MassStatistics, MassSummary};
pub use summed_volume::SummedVolumeTable;

// Curve assembly
pub mod curve;
pub mod hurst;
pub use curve::{
  lacunarity, normalize, raw_lacunarity, CurveConfig, CurveStats, LacunarityCurveBuilder,
  LacunarityRow, LacunarityTable, Parallelism,
};
pub use hurst::{HurstEstimator, LogSlopeHurst};

#[cfg(test)]
pub(crate) mod test_utils;
