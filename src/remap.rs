//! Length-bucket remapping of an existing table.
//!
//! Re-reads a previously produced feature table and rewrites one column
//! through a bucket mapping (label → id), leaving every other column
//! untouched. The header passes through unchanged; rows with an unknown
//! bucket label are dropped with a warning.

use snafu::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::warn;

use crate::config::RemapConfig;
use crate::error::{
    MappingSnafu, OpenInputSnafu, ReadInputSnafu, RemapSnafu, RunError, ShortRowSnafu, TableSnafu,
};
use crate::mapping::Mapping;
use crate::sink::TableWriter;
use crate::SEPARATOR;

/// Statistics about a remap run.
#[derive(Debug, Clone, Default)]
pub struct RemapStats {
    pub rows_written: u64,
    pub rows_dropped: u64,
}

/// Run the remap mode to completion.
pub fn run_remap(config: &RemapConfig) -> Result<RemapStats, RunError> {
    let buckets = Mapping::from_file(&config.bucket_map).context(MappingSnafu)?;

    let input = File::open(&config.input)
        .context(OpenInputSnafu {
            path: &config.input,
        })
        .context(RemapSnafu)?;
    let reader = BufReader::new(input);
    let mut writer = TableWriter::create(&config.output).context(TableSnafu)?;
    let mut stats = RemapStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line
            .context(ReadInputSnafu {
                path: &config.input,
            })
            .context(RemapSnafu)?;
        let mut fields: Vec<String> = line.split(SEPARATOR).map(str::to_string).collect();

        if index == 0 {
            writer.write_header(&fields).context(TableSnafu)?;
            continue;
        }

        let Some(label) = fields.get_mut(config.column) else {
            return ShortRowSnafu {
                line: index + 1,
                column: config.column,
            }
            .fail()
            .context(RemapSnafu);
        };
        match buckets.get(label) {
            Some(id) => {
                *label = id.to_string();
                writer.write_row(&fields).context(TableSnafu)?;
            }
            None => {
                warn!(line = index + 1, label = %label, "unknown length bucket, dropping row");
                stats.rows_dropped += 1;
            }
        }
    }

    stats.rows_written = writer.finish().context(TableSnafu)?;
    Ok(stats)
}
