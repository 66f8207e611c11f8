//! Hurst-like exponent H(r) from a normalized lacunarity curve.
//!
//! Kept behind [`HurstEstimator`] so the raw and normalized lacunarity columns
//! never depend on the choice of transform. Swap it on the curve builder with
//! `with_hurst`.
//!
//! # Default: [`LogSlopeHurst`]
//!
//! For uncorrelated occupancy in `D` dimensions, box-mass variance and squared
//! mean scale so that `Λ(r) - 1 ∝ r^-D`. Correlated structure decays slower,
//! regular (anti-persistent) structure faster. With
//! `β(r) = d ln normΛ / d ln r` the estimate is
//!
//! ```text
//! H(r) = clamp(1 + β(r) / (2·D), 0, 1)
//! ```
//!
//! so `β = -D` gives 0.5 (Brownian), a flat curve gives 1 and a collapse
//! faster than `r^-2D` gives 0. `β` uses central differences in log-log space
//! between neighbouring box sizes, one-sided at the ends.
//!
//! H(r) is NaN where the slope is undefined: a single box size, or a
//! neighbouring normalized lacunarity that is not strictly positive.

/// Transform from `(box sizes, normalized lacunarity)` to H(r), one value per
/// box size.
pub trait HurstEstimator: Send + Sync {
  fn estimate(&self, box_sizes: &[usize], normalized: &[f64]) -> Vec<f64>;
}

impl<F> HurstEstimator for F
where
  F: Fn(&[usize], &[f64]) -> Vec<f64> + Send + Sync,
{
  fn estimate(&self, box_sizes: &[usize], normalized: &[f64]) -> Vec<f64> {
    self(box_sizes, normalized)
  }
}

/// Local log-log slope of normalized lacunarity, mapped onto [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogSlopeHurst {
  /// Embedding dimension of the volume.
  pub dimension: u32,
}

impl Default for LogSlopeHurst {
  fn default() -> Self {
    Self { dimension: 3 }
  }
}

impl LogSlopeHurst {
  pub fn new(dimension: u32) -> Self {
    Self { dimension }
  }

  /// Map a log-log slope to H.
  #[inline]
  pub fn from_slope(&self, slope: f64) -> f64 {
    if slope.is_nan() {
      return f64::NAN;
    }
    (1.0 + slope / (2.0 * self.dimension as f64)).clamp(0.0, 1.0)
  }
}

fn log_slope(r_a: usize, l_a: f64, r_b: usize, l_b: f64) -> f64 {
  if l_a <= 0.0 || l_b <= 0.0 || r_a == r_b {
    return f64::NAN;
  }
  (l_b.ln() - l_a.ln()) / ((r_b as f64).ln() - (r_a as f64).ln())
}

impl HurstEstimator for LogSlopeHurst {
  fn estimate(&self, box_sizes: &[usize], normalized: &[f64]) -> Vec<f64> {
    let n = box_sizes.len().min(normalized.len());
    if n < 2 {
      return vec![f64::NAN; n];
    }

    (0..n)
      .map(|idx| {
        let lo = idx.saturating_sub(1);
        let hi = (idx + 1).min(n - 1);
        let slope = log_slope(box_sizes[lo], normalized[lo], box_sizes[hi], normalized[hi]);
        self.from_slope(slope)
      })
      .collect()
  }
}

#[cfg(test)]
#[path = "hurst_test.rs"]
mod hurst_test;
