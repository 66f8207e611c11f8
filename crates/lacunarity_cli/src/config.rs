//! Configuration parsing for lacunarity runs.

use anyhow::{Context, Result};
use lacunarity::{BoxSizeSpec, Occupancy, Parallelism};
use serde::Deserialize;
use std::path::Path;

/// Root configuration loaded from TOML. Every field is optional; command line
/// flags take precedence.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// Box sizes: `"all"`, `"pow2"`, a list string or an integer array.
	#[serde(default)]
	pub box_sizes: Option<BoxSizesSetting>,
	/// Occupancy threshold; omitted keeps raw counts.
	#[serde(default)]
	pub threshold: Option<f64>,
	/// Zero padding appended to each axis [x, y, z].
	#[serde(default)]
	pub pad: Option<[usize; 3]>,
	/// Explicit volume dimensions; inferred from the voxel table otherwise.
	#[serde(default)]
	pub dimensions: Option<[usize; 3]>,
	/// Scan box sizes in parallel.
	#[serde(default = "default_parallel")]
	pub parallel: bool,
	/// Output format.
	#[serde(default)]
	pub format: Option<OutputFormat>,
}

/// Box size setting as written in TOML.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BoxSizesSetting {
	/// `box_sizes = "all"` or `box_sizes = "1,2,4"`.
	Token(String),
	/// `box_sizes = [1, 2, 4]`.
	List(Vec<i64>),
}

/// Output table encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	#[default]
	Csv,
	Json,
}

fn default_parallel() -> bool {
	true
}

impl Default for Config {
	fn default() -> Self {
		Self {
			box_sizes: None,
			threshold: None,
			pad: None,
			dimensions: None,
			parallel: default_parallel(),
			format: None,
		}
	}
}

impl BoxSizesSetting {
	pub fn to_spec(&self) -> Result<BoxSizeSpec> {
		match self {
			BoxSizesSetting::Token(token) => Ok(token.parse::<BoxSizeSpec>()?),
			BoxSizesSetting::List(sizes) => {
				if sizes.is_empty() {
					anyhow::bail!("box_sizes list must not be empty");
				}
				Ok(BoxSizeSpec::List(sizes.clone()))
			}
		}
	}
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content)
	}

	/// Parse and validate TOML content.
	pub fn parse(content: &str) -> Result<Self> {
		let config: Config =
			toml::from_str(content).with_context(|| "Failed to parse config TOML")?;

		if let Some(setting) = &config.box_sizes {
			setting.to_spec().context("Invalid box_sizes")?;
		}
		if let Some(threshold) = config.threshold {
			if !threshold.is_finite() || threshold < 0.0 {
				anyhow::bail!("threshold must be a finite value >= 0, got {}", threshold);
			}
		}
		if let Some(dims) = config.dimensions {
			if dims.contains(&0) {
				anyhow::bail!("dimensions must all be positive, got {:?}", dims);
			}
		}

		Ok(config)
	}

	pub fn box_size_spec(&self) -> Result<BoxSizeSpec> {
		match &self.box_sizes {
			Some(setting) => setting.to_spec(),
			None => Ok(BoxSizeSpec::All),
		}
	}

	pub fn occupancy(&self) -> Occupancy {
		match self.threshold {
			Some(t) => Occupancy::Threshold(t),
			None => Occupancy::Counts,
		}
	}

	pub fn parallelism(&self) -> Parallelism {
		if self.parallel {
			Parallelism::Rayon
		} else {
			Parallelism::Sequential
		}
	}
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
