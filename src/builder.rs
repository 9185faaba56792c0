// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

use crate::{
    error::Result,
    mapping::Mapping,
    projection::{Table, project},
    rdf_reader::{read_nquads, read_turtle},
    writer::write_csv,
};
use log::{debug, error};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT: &str = "output.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Destination of the CSV, relative to the working directory unless absolute
    pub output_path: PathBuf,
    /// Base IRI for relative IRIs in the mapping document
    pub base_iri: Option<String>,
    pub delimiter: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            base_iri: None,
            delimiter: b',',
        }
    }
}

/// Read the quads and the mapping, recover the table, and write it to
/// `options.output_path`. Nothing is written unless every earlier step
/// succeeded.
pub fn build_csv(quad_file: &Path, mapping_file: &Path, options: &Options) -> Result<Table> {
    let timer = std::time::Instant::now();

    let table = load_and_project(quad_file, mapping_file, options.base_iri.as_deref())
        .inspect_err(|e| error!("conversion failed: {e}"))?;
    debug!("projection time: {:?}", timer.elapsed());

    write_csv(&table, &options.output_path, options.delimiter)
        .inspect_err(|e| error!("failed to write {}: {e}", options.output_path.display()))?;

    debug!("Total execution time: {:?}", timer.elapsed());
    Ok(table)
}

fn load_and_project(quad_file: &Path, mapping_file: &Path, base_iri: Option<&str>) -> Result<Table> {
    let mapping = Mapping::from_quads(&read_turtle(mapping_file, base_iri)?)?;
    let quads = read_nquads(quad_file)?;
    project(&quads, &mapping)
}
