//! Voxel table input and lacunarity table output.
//!
//! Input CSV header: `x,y,z,count`. Output columns follow `LacunarityRow`:
//! `box_size,mean_mass,variance_mass,lacunarity,normalized_lacunarity,h_r`.

use anyhow::{Context, Result};
use lacunarity::{LacunarityTable, VoxelCount};
use std::io::{Read, Write};

use crate::config::OutputFormat;

/// Read voxel rows from CSV.
pub fn read_voxel_table<R: Read>(reader: R) -> Result<Vec<VoxelCount>> {
	let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

	csv.deserialize::<VoxelCount>()
		.enumerate()
		.map(|(line, row)| row.with_context(|| format!("Invalid voxel row {}", line + 1)))
		.collect()
}

/// Write the result table in the requested format.
pub fn write_table<W: Write>(table: &LacunarityTable, format: OutputFormat, writer: W) -> Result<()> {
	match format {
		OutputFormat::Csv => {
			let mut csv = csv::Writer::from_writer(writer);
			for row in table {
				csv.serialize(row).context("Failed to write CSV row")?;
			}
			csv.flush().context("Failed to flush CSV output")?;
		}
		OutputFormat::Json => {
			let mut writer = writer;
			serde_json::to_writer_pretty(&mut writer, table.rows())
				.context("Failed to write JSON output")?;
			writeln!(writer)?;
		}
	}
	Ok(())
}
