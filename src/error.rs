//! Error types for keytable using snafu.
//!
//! This module defines structured error types with context selectors for
//! all error conditions in the codebase.

use snafu::prelude::*;
use std::path::PathBuf;

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file {}", path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration"))]
    YamlParse { source: serde_yaml::Error },

    /// Root path is empty.
    #[snafu(display("Root directory cannot be empty"))]
    EmptyRoot,

    /// Output path is empty.
    #[snafu(display("Output path cannot be empty"))]
    EmptyOutput,

    /// Root path does not exist or is not a directory.
    #[snafu(display("Root {} does not exist or is not a directory", path.display()))]
    RootNotADirectory { path: PathBuf },

    /// A configured divisor is zero.
    #[snafu(display("Divisors must be non-zero"))]
    ZeroDivisor,

    /// MSB/LSB window widths must be at least one bit.
    #[snafu(display("Bit windows must be at least one bit wide (msb={msb}, lsb={lsb})"))]
    EmptyBitWindow { msb: usize, lsb: usize },
}

// ============ Mapping Errors ============

/// Errors that can occur while loading a `label;id` mapping file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MappingError {
    /// Failed to read the mapping file.
    #[snafu(display("Failed to read mapping file {}", path.display()))]
    MappingRead {
        source: std::io::Error,
        path: PathBuf,
    },

    /// A line did not split into exactly two fields.
    #[snafu(display("Bad mapping in file {} on line {line}", path.display()))]
    MalformedLine { path: PathBuf, line: usize },

    /// The id field was not an integer.
    #[snafu(display("Bad mapping id {value:?} in file {} on line {line}", path.display()))]
    BadId {
        source: std::num::ParseIntError,
        path: PathBuf,
        line: usize,
        value: String,
    },
}

// ============ Feature Errors ============

/// Errors that can occur during feature extraction from a modulus.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FeatureError {
    /// Modulus hex string did not parse.
    #[snafu(display("Malformed modulus hex {value:?}"))]
    BadHex { value: String },

    /// Modulus has too few bits for the configured windows.
    #[snafu(display("Modulus of {bits} bits is too short for msb={msb}, lsb={lsb}"))]
    TooShort { bits: u64, msb: usize, lsb: usize },

    /// Record line has no field at the modulus column index.
    #[snafu(display("Record has no modulus at column {column}: {line:?}"))]
    MissingColumn { column: usize, line: String },
}

// ============ Table Errors ============

/// Errors that can occur while writing the output table.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TableError {
    /// Failed to create the output file.
    #[snafu(display("Failed to create output table {}", path.display()))]
    Create {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write to the output table.
    #[snafu(display("Failed to write to output table"))]
    Write { source: std::io::Error },

    /// Header was written more than once (internal state error).
    #[snafu(display("Table header written twice"))]
    HeaderRewrite,

    /// A data row was written before the header.
    #[snafu(display("Table row written before header"))]
    RowBeforeHeader,
}

// ============ Source Errors ============

/// Errors that can occur while reading source directories and record files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// Failed to list a directory.
    #[snafu(display("Failed to list directory {}", path.display()))]
    ListDir {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read a record file.
    #[snafu(display("Failed to read record file {}", path.display()))]
    ReadRecords {
        source: std::io::Error,
        path: PathBuf,
    },
}

// ============ Remap Errors ============

/// Errors that can occur in remap mode.
///
/// An unknown bucket label is not an error: the row is dropped with a
/// warning and the run continues.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RemapError {
    /// Failed to open the input table.
    #[snafu(display("Failed to open input table {}", path.display()))]
    OpenInput {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read a line from the input table.
    #[snafu(display("Failed to read input table {}", path.display()))]
    ReadInput {
        source: std::io::Error,
        path: PathBuf,
    },

    /// A data row has no field at the bucket column index.
    #[snafu(display("Row {line} has no column {column}"))]
    ShortRow { line: usize, column: usize },
}

// ============ Run Error (top-level) ============

/// Top-level run errors that aggregate all error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RunError {
    /// Configuration error.
    #[snafu(display("Configuration error"))]
    Config { source: ConfigError },

    /// Mapping file error.
    #[snafu(display("Mapping error"))]
    Mapping { source: MappingError },

    /// Feature extraction error.
    #[snafu(display("Feature extraction error"))]
    Feature { source: FeatureError },

    /// Output table error.
    #[snafu(display("Table error"))]
    Table { source: TableError },

    /// Source reading error.
    #[snafu(display("Source error"))]
    Source { source: SourceError },

    /// Remap mode error.
    #[snafu(display("Remap error"))]
    Remap { source: RemapError },
}
