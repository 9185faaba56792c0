// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

use crate::{error::Result, projection::Table};
use log::debug;
use std::path::Path;

/// Write `table` to `dest` as CSV.
///
/// Rows go to a temporary file next to `dest` which is renamed over it once
/// complete. A failure at any point leaves `dest` untouched.
pub fn write_csv(table: &Table, dest: &Path, delimiter: u8) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp_file = tempfile::Builder::new()
        .prefix(".rml2csv-")
        .suffix(".csv")
        .tempfile_in(dir)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(tmp_file.as_file());
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    tmp_file.as_file().sync_all()?;

    tmp_file.persist(dest).map_err(|e| e.error)?;
    debug!("wrote {} rows to {}", table.len(), dest.display());
    Ok(())
}
