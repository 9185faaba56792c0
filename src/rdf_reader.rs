// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

use crate::error::{Error, InputRole, Result};
use log::debug;
use oxrdf::Quad;
use oxrdfio::{RdfFormat, RdfParser};
use std::{fs::File, io::BufReader, path::Path};

/// Parse an N-Quads file into memory.
pub fn read_nquads(path: &Path) -> Result<Vec<Quad>> {
    read_quads(path, RdfParser::from_format(RdfFormat::NQuads), InputRole::Quads)
}

/// Parse a Turtle file, resolving relative IRIs against `base_iri` when given.
pub fn read_turtle(path: &Path, base_iri: Option<&str>) -> Result<Vec<Quad>> {
    let mut parser = RdfParser::from_format(RdfFormat::Turtle);
    if let Some(base) = base_iri {
        parser = parser.with_base_iri(base).map_err(|e| Error::Parse {
            role: InputRole::Mapping,
            path: path.to_path_buf(),
            message: format!("invalid base IRI {base}: {e}"),
        })?;
    }
    read_quads(path, parser, InputRole::Mapping)
}

fn read_quads(path: &Path, parser: RdfParser, role: InputRole) -> Result<Vec<Quad>> {
    let timer = std::time::Instant::now();
    let source = BufReader::new(File::open(path)?);

    let quads = parser
        .for_reader(source)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Parse {
            role,
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    debug!(
        "read {} quads from {} in {:?}",
        quads.len(),
        path.display(),
        timer.elapsed()
    );
    Ok(quads)
}
