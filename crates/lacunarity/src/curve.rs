//! Lacunarity curve orchestrator.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌─────────────────┐     ┌────────────┐     ┌───────┐
//! │ BinaryVolume ├────►│ SummedVolumeTable├────►│ GlidingBoxScan r├────►│ Statistics ├────►│  Row  │
//! └──────────────┘     └──────────────────┘     └─────────────────┘     └────────────┘     └───────┘
//!                        built once, shared        one per box size      (mean, var)      Λ, normΛ, H
//! ```
//!
//! Box sizes are independent given the table, so they are scanned in parallel
//! via rayon. The indexed collect writes each summary into the slot of its box
//! size, so row order follows the validated ascending set, not completion
//! order.

use rayon::prelude::*;
use web_time::Instant;

use crate::box_sizes::{BoxSizeSet, BoxSizeSpec};
use crate::error::{LacunarityError, Result};
use crate::hurst::{HurstEstimator, LogSlopeHurst};
use crate::scanner::GlidingBoxScanner;
use crate::statistics::MassSummary;
use crate::summed_volume::SummedVolumeTable;
use crate::volume::{BinaryVolume, Dimensions};

/// How box sizes (and the planes within each) are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
  /// Everything on the calling thread.
  Sequential,
  /// rayon's global pool.
  #[default]
  Rayon,
}

/// Configuration for curve building.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveConfig {
  pub box_sizes: BoxSizeSpec,
  pub parallelism: Parallelism,
}

impl CurveConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_box_sizes(mut self, box_sizes: BoxSizeSpec) -> Self {
    self.box_sizes = box_sizes;
    self
  }

  pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
    self.parallelism = parallelism;
    self
  }
}

/// One output row per box size.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LacunarityRow {
  pub box_size: usize,
  pub mean_mass: f64,
  pub variance_mass: f64,
  /// Λ(r) = var / mean² + 1, always >= 1.
  pub lacunarity: f64,
  /// ln Λ(r) / ln Λ(r_min); exactly 1 at the smallest box size.
  pub normalized_lacunarity: f64,
  pub h_r: f64,
}

/// Rows in ascending box-size order.
#[derive(Clone, Debug, PartialEq)]
pub struct LacunarityTable {
  dimensions: Dimensions,
  rows: Vec<LacunarityRow>,
}

impl LacunarityTable {
  /// Dimensions of the volume the table was computed from.
  pub fn dimensions(&self) -> Dimensions {
    self.dimensions
  }

  pub fn rows(&self) -> &[LacunarityRow] {
    &self.rows
  }

  pub fn into_rows(self) -> Vec<LacunarityRow> {
    self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Row for `box_size`, if it was requested.
  pub fn row(&self, box_size: usize) -> Option<&LacunarityRow> {
    self
      .rows
      .binary_search_by_key(&box_size, |row| row.box_size)
      .ok()
      .map(|idx| &self.rows[idx])
  }

  pub fn iter(&self) -> std::slice::Iter<'_, LacunarityRow> {
    self.rows.iter()
  }
}

impl<'a> IntoIterator for &'a LacunarityTable {
  type Item = &'a LacunarityRow;
  type IntoIter = std::slice::Iter<'a, LacunarityRow>;

  fn into_iter(self) -> Self::IntoIter {
    self.rows.iter()
  }
}

/// Statistics from curve building.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveStats {
  /// Number of box sizes scanned.
  pub box_size_count: usize,
  /// Windows visited across all box sizes.
  pub window_count: u64,
  /// Prefix-sum table build time in microseconds.
  pub prefix_build_us: u64,
  /// Total time in microseconds, validation included.
  pub total_us: u64,
}

/// Λ(r) from box-mass statistics.
#[inline]
pub fn raw_lacunarity(summary: &MassSummary) -> f64 {
  summary.variance / (summary.mean * summary.mean) + 1.0
}

/// Normalize a lacunarity curve against its first (smallest-scale) entry.
///
/// The first entry is 1 by definition. Later entries with Λ = 1 are 0, and so
/// is everything after a reference of Λ(r_min) = 1, which has no
/// heterogeneity to normalize against.
pub fn normalize(lacunarity: &[f64]) -> Vec<f64> {
  let Some(&reference) = lacunarity.first() else {
    return Vec::new();
  };
  let log_reference = reference.ln();

  lacunarity
    .iter()
    .enumerate()
    .map(|(idx, &value)| {
      if idx == 0 {
        1.0
      } else if value == 1.0 || log_reference == 0.0 {
        0.0
      } else {
        value.ln() / log_reference
      }
    })
    .collect()
}

/// Builds lacunarity tables from volumes.
pub struct LacunarityCurveBuilder {
  config: CurveConfig,
  hurst: Box<dyn HurstEstimator>,
}

impl Default for LacunarityCurveBuilder {
  fn default() -> Self {
    Self::new(CurveConfig::default())
  }
}

impl std::fmt::Debug for LacunarityCurveBuilder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LacunarityCurveBuilder")
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

impl LacunarityCurveBuilder {
  pub fn new(config: CurveConfig) -> Self {
    Self {
      config,
      hurst: Box::new(LogSlopeHurst::default()),
    }
  }

  /// Replace the H(r) transform.
  pub fn with_hurst<H: HurstEstimator + 'static>(mut self, hurst: H) -> Self {
    self.hurst = Box::new(hurst);
    self
  }

  pub fn config(&self) -> &CurveConfig {
    &self.config
  }

  /// Validate, build the prefix-sum table once, scan every box size.
  ///
  /// All validation happens before the first window is visited.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "curve::build"))]
  pub fn build(&self, volume: &BinaryVolume) -> Result<LacunarityTable> {
    self.build_timed(volume).map(|(table, _)| table)
  }

  /// Same as `build` but also returns timing stats.
  pub fn build_timed(&self, volume: &BinaryVolume) -> Result<(LacunarityTable, CurveStats)> {
    let start = Instant::now();

    let sizes = BoxSizeSet::resolve(&self.config.box_sizes, volume.dimensions())?;
    if volume.total_mass() <= 0.0 {
      return Err(LacunarityError::EmptyVolume);
    }

    let table = {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("prefix_sum_build").entered();
      SummedVolumeTable::build(volume)
    };
    let prefix_build_us = start.elapsed().as_micros() as u64;

    let (result, window_count) = self.build_from_table(&table, &sizes)?;

    let stats = CurveStats {
      box_size_count: sizes.len(),
      window_count,
      prefix_build_us,
      total_us: start.elapsed().as_micros() as u64,
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
      box_sizes = stats.box_size_count,
      windows = stats.window_count,
      prefix_build_us = stats.prefix_build_us,
      total_us = stats.total_us,
      "lacunarity curve built"
    );

    Ok((result, stats))
  }

  /// Scan a prebuilt table for an already validated box-size set.
  ///
  /// Returns the table and the number of windows visited.
  pub fn build_from_table(
    &self,
    table: &SummedVolumeTable,
    sizes: &BoxSizeSet,
  ) -> Result<(LacunarityTable, u64)> {
    let summaries: Vec<MassSummary> = {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("gliding_box_scan").entered();

      match self.config.parallelism {
        Parallelism::Sequential => sizes
          .iter()
          .map(|r| scan_box_size(table, r, Parallelism::Sequential))
          .collect::<Result<_>>()?,
        Parallelism::Rayon => sizes
          .as_slice()
          .par_iter()
          .map(|&r| scan_box_size(table, r, Parallelism::Rayon))
          .collect::<Result<_>>()?,
      }
    };

    let window_count = summaries.iter().map(|s| s.count).sum();
    let lacunarity: Vec<f64> = summaries.iter().map(raw_lacunarity).collect();
    let normalized = normalize(&lacunarity);
    let h_r = self.hurst.estimate(sizes.as_slice(), &normalized);

    let rows = sizes
      .iter()
      .enumerate()
      .map(|(idx, box_size)| LacunarityRow {
        box_size,
        mean_mass: summaries[idx].mean,
        variance_mass: summaries[idx].variance,
        lacunarity: lacunarity[idx],
        normalized_lacunarity: normalized[idx],
        h_r: h_r.get(idx).copied().unwrap_or(f64::NAN),
      })
      .collect();

    Ok((
      LacunarityTable {
        dimensions: table.dimensions(),
        rows,
      },
      window_count,
    ))
  }
}

/// Mean and variance of all window masses at one box size.
fn scan_box_size(
  table: &SummedVolumeTable,
  box_size: usize,
  parallelism: Parallelism,
) -> Result<MassSummary> {
  let scanner = GlidingBoxScanner::new(table, box_size)?;
  let stats = match parallelism {
    Parallelism::Sequential => scanner.statistics(),
    Parallelism::Rayon => scanner.par_statistics(),
  };
  let summary = stats.summary(box_size)?;

  #[cfg(feature = "tracing")]
  tracing::trace!(
    box_size,
    windows = summary.count,
    mean = summary.mean,
    variance = summary.variance,
    "box size scanned"
  );

  Ok(summary)
}

/// Lacunarity table for `volume` at `box_sizes` with default settings.
pub fn lacunarity(volume: &BinaryVolume, box_sizes: &BoxSizeSpec) -> Result<LacunarityTable> {
  LacunarityCurveBuilder::new(CurveConfig::new().with_box_sizes(box_sizes.clone())).build(volume)
}

#[cfg(test)]
#[path = "curve_test.rs"]
mod curve_test;
