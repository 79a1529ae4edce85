//! Source directory processing.
//!
//! Reads every record file under one source directory in lexicographic
//! order, skips each file's header line, extracts features from the
//! modulus column and writes annotated rows, subject to the skip/emit
//! budget fixed at directory entry.

use snafu::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{
    FeatureSnafu, ListDirSnafu, MissingColumnSnafu, ReadRecordsSnafu, RunError, SourceError,
    SourceSnafu, TableSnafu,
};
use crate::features::FeatureExtractor;
use crate::quota::{Admission, Budget};
use crate::sink::TableWriter;
use crate::SEPARATOR;

/// List the immediate subdirectories of `dir`, sorted by name.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    list_entries(dir, |entry| entry.is_dir())
}

/// List the plain files directly under `dir`, sorted by name.
pub fn list_record_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    list_entries(dir, |entry| entry.is_file())
}

fn list_entries(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, SourceError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).context(ListDirSnafu { path: dir })? {
        let entry = entry.context(ListDirSnafu { path: dir })?;
        let path = entry.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Outcome of processing one source directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryOutcome {
    /// Record files opened.
    pub files_read: usize,
}

/// Processes the record files of source directories.
#[derive(Debug)]
pub struct SourceProcessor<'a> {
    extractor: &'a FeatureExtractor,
    modulus_column: usize,
}

impl<'a> SourceProcessor<'a> {
    /// Create a processor over the given extractor.
    pub fn new(extractor: &'a FeatureExtractor, modulus_column: usize) -> Self {
        Self {
            extractor,
            modulus_column,
        }
    }

    /// Process every record file under `dir`.
    ///
    /// The budget was computed at directory entry and stays fixed here:
    /// records are skipped while its skip allowance lasts, emitted while
    /// its emit allowance lasts, and the rest of the directory is ignored.
    /// Each file's first line is a header and is always discarded.
    pub fn process_directory(
        &self,
        dir: &Path,
        source_id: i64,
        group_id: i64,
        budget: &mut Budget,
        writer: &mut TableWriter,
    ) -> Result<DirectoryOutcome, RunError> {
        let files = list_record_files(dir).context(SourceSnafu)?;
        let mut outcome = DirectoryOutcome::default();

        'files: for path in &files {
            outcome.files_read += 1;
            let file = File::open(path)
                .context(ReadRecordsSnafu { path })
                .context(SourceSnafu)?;
            let reader = BufReader::new(file);

            for (index, line) in reader.lines().enumerate() {
                let line = line
                    .context(ReadRecordsSnafu { path })
                    .context(SourceSnafu)?;
                if index == 0 {
                    continue;
                }
                match budget.admit() {
                    Admission::Skip => continue,
                    Admission::Stop => break 'files,
                    Admission::Emit => {
                        self.emit_record(&line, source_id, group_id, writer)?;
                    }
                }
            }
        }

        debug!(
            directory = %dir.display(),
            files = outcome.files_read,
            consumed = budget.consumed(),
            emitted = budget.emitted(),
            "source directory processed"
        );
        Ok(outcome)
    }

    fn emit_record(
        &self,
        line: &str,
        source_id: i64,
        group_id: i64,
        writer: &mut TableWriter,
    ) -> Result<(), RunError> {
        let modulus = line
            .split(SEPARATOR)
            .nth(self.modulus_column)
            .context(MissingColumnSnafu {
                column: self.modulus_column,
                line,
            })
            .context(FeatureSnafu)?;
        let row = self.extractor.extract(modulus).context(FeatureSnafu)?;
        let mut fields = row.into_fields();
        fields.push(group_id.to_string());
        fields.push(source_id.to_string());
        writer.write_row(&fields).context(TableSnafu)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::quota::QuotaTracker;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_record_file(dir: &Path, name: &str, moduli: &[&str]) {
        let mut file = File::create(dir.join(name)).unwrap();
        writeln!(file, "id;modulus;extra").unwrap();
        for (i, modulus) in moduli.iter().enumerate() {
            writeln!(file, "{i};{modulus};x").unwrap();
        }
    }

    fn run_one(
        dir: &Path,
        tracker: &mut QuotaTracker,
        writer: &mut TableWriter,
    ) -> (u64, u64) {
        let extractor = FeatureExtractor::new(FeatureConfig::default());
        let processor = SourceProcessor::new(&extractor, 1);
        let mut budget = tracker.begin(9);
        processor
            .process_directory(dir, 5, 2, &mut budget, writer)
            .unwrap();
        let counts = (budget.consumed(), budget.emitted());
        tracker.commit(9, &budget);
        counts
    }

    #[test]
    fn test_header_line_is_discarded() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("src");
        std::fs::create_dir(&dir).unwrap();
        write_record_file(&dir, "keys.csv", &["C9", "E5"]);

        let mut writer = TableWriter::create(tmp.path().join("out.csv")).unwrap();
        writer.write_header(&["modulus".to_string()]).unwrap();
        let mut tracker = QuotaTracker::new(0, None);
        let (consumed, emitted) = run_one(&dir, &mut tracker, &mut writer);
        assert_eq!((consumed, emitted), (2, 2));
    }

    #[test]
    fn test_budget_applies_across_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("src");
        std::fs::create_dir(&dir).unwrap();
        // Lexicographic file order: a.csv before b.csv.
        write_record_file(&dir, "a.csv", &["C9", "C9", "C9"]);
        write_record_file(&dir, "b.csv", &["C9", "C9", "C9"]);

        let mut writer = TableWriter::create(tmp.path().join("out.csv")).unwrap();
        writer.write_header(&["f".to_string()]).unwrap();
        let mut tracker = QuotaTracker::new(4, Some(1));
        let (consumed, emitted) = run_one(&dir, &mut tracker, &mut writer);
        // 4 skipped (all of a.csv plus one of b.csv), 1 emitted, 1 ignored.
        assert_eq!((consumed, emitted), (5, 1));
    }

    #[test]
    fn test_malformed_modulus_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("src");
        std::fs::create_dir(&dir).unwrap();
        write_record_file(&dir, "keys.csv", &["notahex"]);

        let mut writer = TableWriter::create(tmp.path().join("out.csv")).unwrap();
        writer.write_header(&["f".to_string()]).unwrap();
        let extractor = FeatureExtractor::new(FeatureConfig::default());
        let processor = SourceProcessor::new(&extractor, 1);
        let mut budget = QuotaTracker::new(0, None).begin(9);
        let err = processor
            .process_directory(&dir, 5, 2, &mut budget, &mut writer)
            .unwrap_err();
        assert!(matches!(err, RunError::Feature { .. }));
    }
}
