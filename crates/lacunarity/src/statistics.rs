//! Single-pass mean and population variance of box masses.
//!
//! Uses Welford's running update so large sample counts do not lose precision
//! to the `E[x²] - E[x]²` cancellation. Partial accumulators combine with
//! Chan et al.'s pairwise formula.

use crate::error::{LacunarityError, Result};

/// Running accumulator over a stream of mass values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MassStatistics {
  count: u64,
  mean: f64,
  /// Sum of squared deviations from the running mean.
  m2: f64,
}

/// Finished statistics for one box size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassSummary {
  pub count: u64,
  pub mean: f64,
  /// Population variance (divides by `count`).
  pub variance: f64,
}

impl MassStatistics {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn push(&mut self, value: f64) {
    self.count += 1;
    let delta = value - self.mean;
    self.mean += delta / self.count as f64;
    self.m2 += delta * (value - self.mean);
  }

  /// Fold `other` into `self`.
  pub fn merge(&mut self, other: &MassStatistics) {
    if other.count == 0 {
      return;
    }
    if self.count == 0 {
      *self = *other;
      return;
    }

    let n_a = self.count as f64;
    let n_b = other.count as f64;
    let n = n_a + n_b;
    let delta = other.mean - self.mean;

    self.mean += delta * n_b / n;
    self.m2 += other.m2 + delta * delta * n_a * n_b / n;
    self.count += other.count;
  }

  #[inline]
  pub fn count(&self) -> u64 {
    self.count
  }

  /// Mean and population variance. `box_size` only labels the error.
  pub fn summary(&self, box_size: usize) -> Result<MassSummary> {
    if self.count == 0 {
      return Err(LacunarityError::EmptySample { box_size });
    }
    Ok(MassSummary {
      count: self.count,
      mean: self.mean,
      variance: (self.m2 / self.count as f64).max(0.0),
    })
  }
}

impl Extend<f64> for MassStatistics {
  fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
    for value in iter {
      self.push(value);
    }
  }
}

impl FromIterator<f64> for MassStatistics {
  fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
    let mut stats = MassStatistics::new();
    stats.extend(iter);
    stats
  }
}

#[cfg(test)]
#[path = "statistics_test.rs"]
mod statistics_test;
