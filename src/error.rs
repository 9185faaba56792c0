// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

//! Error types shared by the conversion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// The three failure categories surfaced to a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A path was empty or did not resolve to an existing file.
    MissingFile,
    /// A file did not carry the expected extension.
    InvalidExtension,
    /// Parsing, mapping, or writing failed.
    ConversionError,
}

/// Which of the two input files an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Quads,
    Mapping,
}

impl std::fmt::Display for InputRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputRole::Quads => f.write_str("RDF file"),
            InputRole::Mapping => f.write_str("Mapping file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{role} was not selected")]
    EmptyPath { role: InputRole },

    #[error("{role} '{}' is missing", path.display())]
    MissingFile { role: InputRole, path: PathBuf },

    #[error("{role} '{}' must have the .{expected} extension", path.display())]
    InvalidExtension {
        role: InputRole,
        path: PathBuf,
        expected: &'static str,
    },

    #[error("error parsing {role} '{}': {message}", path.display())]
    Parse {
        role: InputRole,
        path: PathBuf,
        message: String,
    },

    #[error("invalid RML mapping: {0}")]
    Mapping(String),

    #[error("invalid template '{template}': {message}")]
    Template { template: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Collapse the detailed error onto the user-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyPath { .. } | Error::MissingFile { .. } => ErrorKind::MissingFile,
            Error::InvalidExtension { .. } => ErrorKind::InvalidExtension,
            Error::Parse { .. }
            | Error::Mapping(_)
            | Error::Template { .. }
            | Error::Io(_)
            | Error::Csv(_) => ErrorKind::ConversionError,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
