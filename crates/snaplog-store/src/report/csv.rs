//! Tabular change-log report.
//!
//! UTF-8 with a byte-order mark so spreadsheet tools detect the encoding of
//! non-ASCII values. Absent values and timestamps are empty cells.

#![allow(clippy::result_large_err)]

use crate::errors::{from_csv, io_error, Result};
use snaplog_core::sequencer::ChangeEvent;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const HEADER: [&str; 7] = [
    "entity_key",
    "compare_seq",
    "field",
    "old_value",
    "new_value",
    "base_change_dt",
    "change_dt",
];

/// Write `events` as CSV to `writer`, returning the number of data rows.
///
/// # Errors
///
/// `Io` when writing fails.
pub fn write_csv<'a, W, I>(mut writer: W, events: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a ChangeEvent>,
{
    writer
        .write_all(UTF8_BOM)
        .map_err(|e| io_error("write_csv", e))?;

    let mut csv_writer = ::csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(from_csv)?;

    let mut rows = 0;
    for event in events {
        csv_writer
            .write_record([
                event.entity_key.clone(),
                event.compare_sequence.to_string(),
                event.field_path.clone(),
                event.old_value.to_string(),
                event.new_value.to_string(),
                event.base_timestamp.clone().unwrap_or_default(),
                event.change_timestamp.clone().unwrap_or_default(),
            ])
            .map_err(from_csv)?;
        rows += 1;
    }
    csv_writer.flush().map_err(|e| io_error("write_csv", e))?;
    Ok(rows)
}

/// Write the report to `path`, creating parent directories.
///
/// # Errors
///
/// `Io` when the directory or file cannot be created or written.
pub fn write_csv_file<'a, I>(path: &Path, events: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a ChangeEvent>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error("write_csv", e))?;
    }
    let file = File::create(path).map_err(|e| io_error("write_csv", e))?;
    write_csv(BufWriter::new(file), events)
}
