//! Output table writing.
//!
//! Owns the output file handle for the whole run: header exactly once,
//! then one `;`-joined line per accepted row, flushed on finish. The
//! handle is released on drop, so early aborts do not leak it.

use snafu::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{
    CreateSnafu, HeaderRewriteSnafu, RowBeforeHeaderSnafu, TableError, WriteSnafu,
};
use crate::SEPARATOR;

/// Writer for the flat `;`-separated feature table.
#[derive(Debug)]
pub struct TableWriter {
    writer: BufWriter<File>,
    header_written: bool,
    rows_written: u64,
}

impl TableWriter {
    /// Create the output file, truncating any existing table.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::create(path).context(CreateSnafu { path })?;
        Ok(Self {
            writer: BufWriter::new(file),
            header_written: false,
            rows_written: 0,
        })
    }

    /// Write the column header. Must be called exactly once, first.
    pub fn write_header(&mut self, columns: &[String]) -> Result<(), TableError> {
        ensure!(!self.header_written, HeaderRewriteSnafu);
        self.write_line(columns)?;
        self.header_written = true;
        Ok(())
    }

    /// Append one data row.
    pub fn write_row(&mut self, fields: &[String]) -> Result<(), TableError> {
        ensure!(self.header_written, RowBeforeHeaderSnafu);
        self.write_line(fields)?;
        self.rows_written += 1;
        Ok(())
    }

    fn write_line(&mut self, fields: &[String]) -> Result<(), TableError> {
        let mut separate = false;
        for field in fields {
            if separate {
                self.writer
                    .write_all(&[SEPARATOR as u8])
                    .context(WriteSnafu)?;
            }
            self.writer.write_all(field.as_bytes()).context(WriteSnafu)?;
            separate = true;
        }
        self.writer.write_all(b"\n").context(WriteSnafu)?;
        Ok(())
    }

    /// Data rows written so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and close the table, returning the number of data rows.
    pub fn finish(mut self) -> Result<u64, TableError> {
        self.writer.flush().context(WriteSnafu)?;
        Ok(self.rows_written)
    }
}
