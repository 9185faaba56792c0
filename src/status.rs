// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

//! User-facing status line for a finished request, independent of how a
//! front-end draws it.

use crate::{
    controller::{ConversionResult, MAPPING_EXTENSION, QUAD_EXTENSION},
    error::ErrorKind,
};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub tone: Tone,
    pub text: String,
    /// `file://` link to the written CSV
    pub link: Option<String>,
}

impl From<&ConversionResult> for StatusMessage {
    fn from(result: &ConversionResult) -> Self {
        match result {
            ConversionResult::Success { output_path, .. } => {
                let name = output_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| output_path.display().to_string());
                StatusMessage {
                    tone: Tone::Success,
                    text: format!("CSV file {name} has been successfully created."),
                    link: file_link(output_path),
                }
            }
            ConversionResult::Failure { kind, message } => StatusMessage {
                tone: Tone::Error,
                text: match kind {
                    ErrorKind::MissingFile => {
                        format!("{message}. Please select both files before converting.")
                    }
                    ErrorKind::InvalidExtension => format!(
                        "Please check the file format. RDF file should be .{QUAD_EXTENSION} \
                         and RML file should be .{MAPPING_EXTENSION}."
                    ),
                    ErrorKind::ConversionError => format!("Error during conversion: {message}"),
                },
                link: None,
            },
        }
    }
}

fn file_link(path: &Path) -> Option<String> {
    let absolute = std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .ok()?;
    url::Url::from_file_path(absolute).ok().map(String::from)
}
