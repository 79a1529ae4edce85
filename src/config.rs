//! Configuration parsing and validation.
//!
//! Handles loading the run configuration from a YAML file. The operating
//! mode (extract vs remap) is selected by the `mode` tag in the file.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::{
    ConfigError, EmptyBitWindowSnafu, EmptyOutputSnafu, EmptyRootSnafu, ReadFileSnafu,
    RootNotADirectorySnafu, YamlParseSnafu, ZeroDivisorSnafu,
};

/// Run configuration, tagged by mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Config {
    /// Convert a key-record tree into a feature table.
    Extract(ExtractConfig),
    /// Rewrite the length-bucket column of an existing table.
    Remap(RemapConfig),
}

/// Configuration for the extract mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Root of the two-level source tree (`root/source_type/source/*`).
    pub root: PathBuf,

    /// Path of the output table.
    pub output: PathBuf,

    /// Mapping files resolving source directory names to ids.
    pub mappings: MappingConfig,

    /// Zero-based column of the modulus hex within record lines (default: 1).
    #[serde(default = "default_modulus_column")]
    pub modulus_column: usize,

    /// Feature extraction parameters.
    #[serde(default)]
    pub features: FeatureConfig,

    /// Skip/emit quota parameters.
    #[serde(default)]
    pub quota: QuotaConfig,
}

/// Mapping file locations for the extract mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// `label;id` file mapping source names to source ids.
    pub source_ids: PathBuf,
    /// `label;id` file mapping source names to group ids.
    pub source_groups: PathBuf,
}

/// Feature extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Leading bits to emit, excluding the implicit top bit (default: 6).
    #[serde(default = "default_msb")]
    pub msb: usize,

    /// Trailing bits to emit (default: 1).
    #[serde(default = "default_lsb")]
    pub lsb: usize,

    /// Small divisors for the residue columns (default: [3]).
    #[serde(default = "default_divisors")]
    pub divisors: Vec<u64>,

    /// Emit the raw modulus hex instead of feature fields (default: false).
    #[serde(default)]
    pub passthrough: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            msb: default_msb(),
            lsb: default_lsb(),
            divisors: default_divisors(),
            passthrough: false,
        }
    }
}

/// Skip/emit quota parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Records to skip per counting-key before emitting (default: 0).
    #[serde(default)]
    pub skip_keys: u64,

    /// Records to emit per counting-key; absent means unlimited.
    #[serde(default)]
    pub max_keys: Option<u64>,

    /// Whether quotas are counted per source or per group (default: source).
    #[serde(default)]
    pub balance: BalanceMode,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            skip_keys: 0,
            max_keys: None,
            balance: BalanceMode::default(),
        }
    }
}

/// Counting-key selection for quota accounting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMode {
    #[default]
    Source,
    Group,
}

/// Configuration for the remap mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapConfig {
    /// Previously produced table to rewrite.
    pub input: PathBuf,

    /// Path of the rewritten table.
    pub output: PathBuf,

    /// `label;id` file mapping length-bucket labels to ids.
    pub bucket_map: PathBuf,

    /// Zero-based column holding the bucket label.
    pub column: usize,
}

fn default_modulus_column() -> usize {
    1
}

fn default_msb() -> usize {
    6
}

fn default_lsb() -> usize {
    1
}

fn default_divisors() -> Vec<u64> {
    vec![3]
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        let config: Config = serde_yaml::from_str(&content).context(YamlParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Config::Extract(extract) => extract.validate(),
            Config::Remap(remap) => remap.validate(),
        }
    }
}

impl ExtractConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.root.as_os_str().is_empty(), EmptyRootSnafu);
        ensure!(!self.output.as_os_str().is_empty(), EmptyOutputSnafu);
        ensure!(
            self.root.is_dir(),
            RootNotADirectorySnafu { path: &self.root }
        );
        ensure!(self.features.divisors.iter().all(|d| *d != 0), ZeroDivisorSnafu);
        if !self.features.passthrough {
            ensure!(
                self.features.msb >= 1 && self.features.lsb >= 1,
                EmptyBitWindowSnafu {
                    msb: self.features.msb,
                    lsb: self.features.lsb,
                }
            );
        }
        Ok(())
    }
}

impl RemapConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.output.as_os_str().is_empty(), EmptyOutputSnafu);
        Ok(())
    }
}
