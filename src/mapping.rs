//! Mapping file loading.
//!
//! A mapping file resolves string labels (source directory names, length
//! bucket names) to integer ids. Each line is `label;id` with no escaping;
//! labels may contain anything except the separator.

use snafu::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{BadIdSnafu, MalformedLineSnafu, MappingError, MappingReadSnafu};
use crate::SEPARATOR;

/// An immutable label → id table loaded from a mapping file.
///
/// Backed by a `BTreeMap` so iteration order is deterministic in tests;
/// lookup semantics do not depend on ordering.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: BTreeMap<String, i64>,
}

impl Mapping {
    /// Load a mapping from a `label;id` file.
    ///
    /// Fails on the first line that does not split into exactly two fields
    /// or whose id field is not an integer.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context(MappingReadSnafu { path })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, MappingError> {
        let mut entries = BTreeMap::new();
        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            let mut fields = line.split(SEPARATOR);
            let (Some(label), Some(id), None) = (fields.next(), fields.next(), fields.next())
            else {
                return MalformedLineSnafu {
                    path,
                    line: line_number,
                }
                .fail();
            };
            let id: i64 = id.trim().parse().context(BadIdSnafu {
                path: PathBuf::from(path),
                line: line_number,
                value: id,
            })?;
            entries.insert(label.to_string(), id);
        }
        Ok(Self { entries })
    }

    /// Look up the id for a label.
    pub fn get(&self, label: &str) -> Option<i64> {
        self.entries.get(label).copied()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(label, id)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(label, id)| (label.as_str(), *id))
    }
}
