//! Main conversion driver.
//!
//! Walks the two-level source tree (`root/source_type/source`), resolves
//! source and group ids for each source directory, runs the directory
//! processor under the quota tracker and reports quota shortfalls at the
//! end of the run.

use snafu::prelude::*;
use tracing::{info, warn};

use crate::config::{BalanceMode, ExtractConfig};
use crate::error::{MappingSnafu, RunError, SourceSnafu, TableSnafu};
use crate::features::FeatureExtractor;
use crate::mapping::Mapping;
use crate::quota::{QuotaTracker, ShortfallKind};
use crate::sink::TableWriter;
use crate::source::{list_subdirectories, SourceProcessor};

/// Statistics about an extract run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub sources_processed: usize,
    pub sources_skipped: usize,
    pub files_read: usize,
    pub records_skipped: u64,
    pub records_emitted: u64,
    pub quota_shortfalls: usize,
}

/// Run the extract mode to completion.
///
/// Fatal errors (malformed mapping, malformed modulus, I/O) abort the run;
/// unresolved source directories and quota shortfalls are logged and do
/// not fail the run.
pub fn run_extract(config: &ExtractConfig) -> Result<RunStats, RunError> {
    let source_ids = Mapping::from_file(&config.mappings.source_ids).context(MappingSnafu)?;
    let source_groups =
        Mapping::from_file(&config.mappings.source_groups).context(MappingSnafu)?;
    info!(
        sources = source_ids.len(),
        groups = source_groups.len(),
        "mappings loaded"
    );

    let extractor = FeatureExtractor::new(config.features.clone());
    let processor = SourceProcessor::new(&extractor, config.modulus_column);
    let mut tracker = QuotaTracker::new(config.quota.skip_keys, config.quota.max_keys);
    let mut stats = RunStats::default();

    let mut writer = TableWriter::create(&config.output).context(TableSnafu)?;
    let mut header = extractor.header();
    header.push("group".to_string());
    header.push("source".to_string());
    writer.write_header(&header).context(TableSnafu)?;

    for type_dir in list_subdirectories(&config.root).context(SourceSnafu)? {
        for source_dir in list_subdirectories(&type_dir).context(SourceSnafu)? {
            let name = source_dir
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            let (Some(source_id), Some(group_id)) =
                (source_ids.get(name), source_groups.get(name))
            else {
                warn!(
                    directory = %source_dir.display(),
                    "source or group undefined, skipping directory"
                );
                stats.sources_skipped += 1;
                continue;
            };
            info!(source = name, source_id, group_id, "processing source");

            let key = match config.quota.balance {
                BalanceMode::Source => source_id,
                BalanceMode::Group => group_id,
            };
            let mut budget = tracker.begin(key);
            let outcome =
                processor.process_directory(&source_dir, source_id, group_id, &mut budget, &mut writer)?;
            stats.files_read += outcome.files_read;
            stats.records_skipped += budget.skipped();
            stats.records_emitted += budget.emitted();
            stats.sources_processed += 1;
            tracker.commit(key, &budget);
        }
    }

    for shortfall in tracker.shortfalls() {
        let what = match shortfall.kind {
            ShortfallKind::Skipped => "skipped",
            ShortfallKind::Emitted => "emitted",
        };
        warn!(
            key = shortfall.key,
            actual = shortfall.actual,
            target = shortfall.target,
            "not enough keys, only {} {}",
            shortfall.actual,
            what
        );
        stats.quota_shortfalls += 1;
    }

    writer.finish().context(TableSnafu)?;
    Ok(stats)
}
