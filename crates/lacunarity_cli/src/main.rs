//! Lacunarity curve tool.
//!
//! Reads a voxel table (`x,y,z,count` CSV), builds a 3D occupancy volume and
//! writes the gliding-box lacunarity table for the requested box sizes.
//!
//! Pipeline:
//! - voxel table -> volume (optional occupancy threshold)
//! - optional zero padding per axis
//! - lacunarity curve -> CSV or JSON on stdout or `--output`

mod config;
mod table_io;

use anyhow::{Context, Result};
use clap::Parser;
use lacunarity::{BinaryVolume, BoxSizeSpec, CurveConfig, LacunarityCurveBuilder, Occupancy};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{Config, OutputFormat};

/// Multi-scale gliding-box lacunarity for voxel tables.
#[derive(Parser, Debug)]
#[command(name = "lacunarity")]
#[command(about = "Computes gliding-box lacunarity curves for 3D voxel tables")]
struct Args {
	/// Voxel table CSV with header `x,y,z,count`.
	#[arg(short, long)]
	input: PathBuf,

	/// Optional TOML configuration file.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Box sizes: `all`, `pow2` or a list such as `1,2,4,8`.
	#[arg(short, long)]
	box_sizes: Option<String>,

	/// Occupancy threshold; cells with at least this count become 1.
	#[arg(short, long)]
	threshold: Option<f64>,

	/// Zero padding appended per axis, `X,Y,Z`.
	#[arg(long, value_parser = parse_triple)]
	pad: Option<[usize; 3]>,

	/// Volume dimensions `X,Y,Z` (default: inferred from the table).
	#[arg(long, value_parser = parse_triple)]
	dims: Option<[usize; 3]>,

	/// Output format.
	#[arg(short, long, value_enum)]
	format: Option<OutputFormat>,

	/// Output file (default: stdout).
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Worker threads for the rayon pool (default: one per core).
	#[arg(long)]
	threads: Option<usize>,

	/// Scan on the calling thread only.
	#[arg(long)]
	sequential: bool,
}

/// Parse `X,Y,Z` into three axis values.
fn parse_triple(value: &str) -> Result<[usize; 3], String> {
	let parts: Vec<&str> = value.split(',').map(str::trim).collect();
	if parts.len() != 3 {
		return Err(format!("expected X,Y,Z, got {value:?}"));
	}
	let mut out = [0usize; 3];
	for (slot, part) in out.iter_mut().zip(&parts) {
		*slot = part
			.parse()
			.map_err(|_| format!("invalid axis value {part:?} in {value:?}"))?;
	}
	Ok(out)
}

/// Fold command line flags over the file configuration.
fn merge_args(args: &Args, mut config: Config) -> Result<Config> {
	if let Some(box_sizes) = &args.box_sizes {
		config.box_sizes = Some(config::BoxSizesSetting::Token(box_sizes.clone()));
	}
	if args.threshold.is_some() {
		config.threshold = args.threshold;
	}
	if args.pad.is_some() {
		config.pad = args.pad;
	}
	if args.dims.is_some() {
		config.dimensions = args.dims;
	}
	if args.format.is_some() {
		config.format = args.format;
	}
	if args.sequential {
		config.parallel = false;
	}

	if let Some(threshold) = config.threshold {
		if !threshold.is_finite() || threshold < 0.0 {
			anyhow::bail!("threshold must be a finite value >= 0, got {}", threshold);
		}
	}
	Ok(config)
}

fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();

	let args = Args::parse();

	let file_config = match &args.config {
		Some(path) => {
			tracing::info!("Loading config from: {}", path.display());
			Config::load(path)?
		}
		None => Config::default(),
	};
	let config = merge_args(&args, file_config)?;

	if let Some(threads) = args.threads {
		rayon::ThreadPoolBuilder::new()
			.num_threads(threads)
			.build_global()
			.context("Failed to configure rayon thread pool")?;
	}

	let spec: BoxSizeSpec = config.box_size_spec().context("Invalid box sizes")?;
	let occupancy: Occupancy = config.occupancy();

	let input = File::open(&args.input)
		.with_context(|| format!("Failed to open voxel table: {}", args.input.display()))?;
	let voxels = table_io::read_voxel_table(BufReader::new(input))?;
	tracing::info!("Read {} voxel rows from {}", voxels.len(), args.input.display());

	let mut volume = BinaryVolume::from_voxel_table(config.dimensions, &voxels, occupancy)
		.context("Failed to build volume from voxel table")?;
	if let Some(pad) = config.pad {
		volume = volume.padded(pad).context("Failed to pad volume")?;
	}
	tracing::info!(
		"Volume {:?}: {} occupied cells ({:.4} occupancy)",
		volume.dimensions(),
		volume.occupied_count(),
		volume.occupancy()
	);

	let builder = LacunarityCurveBuilder::new(
		CurveConfig::new()
			.with_box_sizes(spec)
			.with_parallelism(config.parallelism()),
	);
	let (table, stats) = builder
		.build_timed(&volume)
		.context("Lacunarity computation failed")?;
	tracing::info!(
		"Scanned {} box sizes ({} windows) in {} us (prefix sums {} us)",
		stats.box_size_count,
		stats.window_count,
		stats.total_us,
		stats.prefix_build_us
	);

	let format = config.format.unwrap_or_default();
	match &args.output {
		Some(path) => {
			let file = File::create(path)
				.with_context(|| format!("Failed to create output file: {}", path.display()))?;
			table_io::write_table(&table, format, BufWriter::new(file))?;
			tracing::info!("Output written to: {}", path.display());
		}
		None => {
			let stdout = std::io::stdout();
			table_io::write_table(&table, format, stdout.lock())?;
		}
	}

	Ok(())
}
