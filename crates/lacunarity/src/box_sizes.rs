//! Box size resolution.
//!
//! A [`BoxSizeSpec`] is what the caller asks for; a [`BoxSizeSet`] is the
//! validated, ascending, duplicate-free list of scales for one volume.

use std::str::FromStr;

use crate::error::{LacunarityError, Result};
use crate::volume::{validate_dimensions, Dimensions};

/// Requested box sizes, before validation against a volume.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum BoxSizeSpec {
  /// Every integer in `1..=min(nx, ny, nz)`.
  #[default]
  All,
  /// 1, 2, 4, ... up to the smallest dimension.
  PowersOfTwo,
  /// Explicit sizes; may be unsorted or contain duplicates.
  List(Vec<i64>),
}

impl BoxSizeSpec {
  pub fn list<I: IntoIterator<Item = i64>>(sizes: I) -> Self {
    BoxSizeSpec::List(sizes.into_iter().collect())
  }

  pub fn powers_of_two() -> Self {
    BoxSizeSpec::PowersOfTwo
  }
}

impl FromStr for BoxSizeSpec {
  type Err = LacunarityError;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("all") {
      return Ok(BoxSizeSpec::All);
    }
    if trimmed.eq_ignore_ascii_case("pow2") {
      return Ok(BoxSizeSpec::PowersOfTwo);
    }

    let sizes = trimmed
      .split(|c: char| c == ',' || c.is_whitespace())
      .filter(|token| !token.is_empty())
      .map(|token| token.parse::<i64>())
      .collect::<std::result::Result<Vec<_>, _>>()
      .map_err(|_| LacunarityError::InvalidBoxSizeSpec(s.to_string()))?;

    if sizes.is_empty() {
      return Err(LacunarityError::InvalidBoxSizeSpec(s.to_string()));
    }

    Ok(BoxSizeSpec::List(sizes))
  }
}

/// Validated box sizes: ascending, unique, each within `1..=min dimension`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxSizeSet {
  sizes: Vec<usize>,
}

impl BoxSizeSet {
  /// Resolve `spec` against volume dimensions.
  pub fn resolve(spec: &BoxSizeSpec, dimensions: Dimensions) -> Result<Self> {
    validate_dimensions(dimensions)?;
    let max = dimensions.iter().copied().min().unwrap_or(0);

    let sizes = match spec {
      BoxSizeSpec::All => (1..=max).collect(),
      BoxSizeSpec::PowersOfTwo => std::iter::successors(Some(1usize), |r| r.checked_mul(2))
        .take_while(|&r| r <= max)
        .collect(),
      BoxSizeSpec::List(requested) => {
        if requested.is_empty() {
          return Err(LacunarityError::InvalidBoxSizeSpec(String::new()));
        }
        // Report the first offending entry in caller order
        if let Some(&bad) = requested
          .iter()
          .find(|&&r| r <= 0 || r as u64 > max as u64)
        {
          return Err(LacunarityError::InvalidBoxSize { box_size: bad, max });
        }
        let mut sizes: Vec<usize> = requested.iter().map(|&r| r as usize).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
      }
    };

    Ok(Self { sizes })
  }

  #[inline]
  pub fn as_slice(&self) -> &[usize] {
    &self.sizes
  }

  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.sizes.iter().copied()
  }

  pub fn len(&self) -> usize {
    self.sizes.len()
  }

  /// Never true after a successful `resolve`.
  pub fn is_empty(&self) -> bool {
    self.sizes.is_empty()
  }

  /// `r_min`, the reference scale for normalization.
  pub fn smallest(&self) -> usize {
    self.sizes[0]
  }

  pub fn largest(&self) -> usize {
    self.sizes[self.sizes.len() - 1]
  }
}

#[cfg(test)]
#[path = "box_sizes_test.rs"]
mod box_sizes_test;
