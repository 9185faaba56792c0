// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

//! Request/response boundary between a presentation layer and the
//! conversion pipeline.
//!
//! A front-end hands two paths to [`Converter::on_convert_requested`] and
//! renders the returned [`ConversionResult`]. Every failure is reported as a
//! value; the converter is ready for the next request immediately after.

use crate::{
    builder::{Options, build_csv},
    error::{Error, ErrorKind, InputRole, Result},
};
use log::{debug, info, warn};
use std::{
    path::{Path, PathBuf},
    thread::JoinHandle,
};

pub const QUAD_EXTENSION: &str = "nq";
pub const MAPPING_EXTENSION: &str = "ttl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub quad_file: PathBuf,
    pub mapping_file: PathBuf,
}

impl ConversionRequest {
    pub fn new(quad_file: impl Into<PathBuf>, mapping_file: impl Into<PathBuf>) -> Self {
        Self {
            quad_file: quad_file.into(),
            mapping_file: mapping_file.into(),
        }
    }
}

/// A request whose files exist and carry the expected extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    quad_file: PathBuf,
    mapping_file: PathBuf,
}

impl ValidatedRequest {
    pub fn quad_file(&self) -> &Path {
        &self.quad_file
    }

    pub fn mapping_file(&self) -> &Path {
        &self.mapping_file
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success { output_path: PathBuf, rows: usize },
    Failure { kind: ErrorKind, message: String },
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success { .. })
    }

    pub fn output_path(&self) -> Option<&Path> {
        match self {
            ConversionResult::Success { output_path, .. } => Some(output_path),
            ConversionResult::Failure { .. } => None,
        }
    }
}

impl From<Error> for ConversionResult {
    fn from(err: Error) -> Self {
        ConversionResult::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Check that both files exist and carry the recognized extensions.
///
/// Existence is checked before extensions, so an empty or missing path always
/// reports [`ErrorKind::MissingFile`].
pub fn validate(request: &ConversionRequest) -> Result<ValidatedRequest> {
    let inputs = [
        (InputRole::Quads, &request.quad_file, QUAD_EXTENSION),
        (InputRole::Mapping, &request.mapping_file, MAPPING_EXTENSION),
    ];

    for (role, path, _) in inputs {
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyPath { role });
        }
        if !path.is_file() {
            return Err(Error::MissingFile {
                role,
                path: path.clone(),
            });
        }
    }
    for (role, path, expected) in inputs {
        if path.extension().is_none_or(|ext| ext != expected) {
            return Err(Error::InvalidExtension {
                role,
                path: path.clone(),
                expected,
            });
        }
    }

    Ok(ValidatedRequest {
        quad_file: request.quad_file.clone(),
        mapping_file: request.mapping_file.clone(),
    })
}

/// Run the pipeline for a validated request. The output file is written only
/// on success.
pub fn convert(request: &ValidatedRequest, options: &Options) -> ConversionResult {
    match build_csv(&request.quad_file, &request.mapping_file, options) {
        Ok(table) => ConversionResult::Success {
            output_path: options.output_path.clone(),
            rows: table.len(),
        },
        Err(e) => e.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Validating,
    Converting,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct Converter {
    options: Options,
    state: State,
    last_output: Option<PathBuf>,
}

impl Converter {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            state: State::Idle,
            last_output: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Output of the most recent request, if it succeeded.
    pub fn last_output_path(&self) -> Option<&Path> {
        self.last_output.as_deref()
    }

    pub fn on_convert_requested(
        &mut self,
        quad_file: impl AsRef<Path>,
        mapping_file: impl AsRef<Path>,
    ) -> ConversionResult {
        let request = ConversionRequest::new(quad_file.as_ref(), mapping_file.as_ref());
        self.handle(&request)
    }

    pub fn handle(&mut self, request: &ConversionRequest) -> ConversionResult {
        self.transition(State::Validating);
        let result = match validate(request) {
            Ok(validated) => {
                self.transition(State::Converting);
                convert(&validated, &self.options)
            }
            Err(e) => {
                warn!("request rejected: {e}");
                e.into()
            }
        };

        match &result {
            ConversionResult::Success { output_path, rows } => {
                info!("wrote {rows} rows to {}", output_path.display());
                self.last_output = Some(output_path.clone());
                self.transition(State::Succeeded);
            }
            ConversionResult::Failure { .. } => {
                self.last_output = None;
                self.transition(State::Failed);
            }
        }
        self.transition(State::Idle);
        result
    }

    fn transition(&mut self, next: State) {
        debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Run one conversion on a worker thread and hand the result to
/// `on_complete` from that thread.
pub fn spawn_conversion<F>(
    options: Options,
    request: ConversionRequest,
    on_complete: F,
) -> Result<JoinHandle<()>>
where
    F: FnOnce(ConversionResult) + Send + 'static,
{
    let handle = std::thread::Builder::new()
        .name("rml2csv-convert".to_string())
        .spawn(move || {
            let mut converter = Converter::new(options);
            on_complete(converter.handle(&request));
        })?;
    Ok(handle)
}
