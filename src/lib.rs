//! keytable: a library for flattening RSA public-key record trees into
//! `;`-separated feature tables.
//!
//! This library provides components for loading label mappings, extracting
//! bit/residue features from moduli, enforcing per-source skip/emit quotas
//! and writing the resulting flat table.
//!
//! # Example
//!
//! ```ignore
//! use keytable::{run_extract, Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let Config::Extract(config) = Config::from_file("conversion.yaml")? else {
//!         return Err("expected extract mode".into());
//!     };
//!     let stats = run_extract(&config)?;
//!     println!("Emitted {} records", stats.records_emitted);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod mapping;
pub mod pipeline;
pub mod quota;
pub mod remap;
pub mod sink;
pub mod source;

/// Field separator shared by mapping files, record files and the output table.
pub const SEPARATOR: char = ';';

// Re-export main types
pub use config::Config;
pub use pipeline::{run_extract, RunStats};
pub use remap::{run_remap, RemapStats};
