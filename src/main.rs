// Copyright (c) 2025, Decisym, LLC
// Licensed under the BSD 3-Clause License (see LICENSE file in the project root).

use clap::{Parser, ValueHint};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use rml2csv::{
    builder::{DEFAULT_OUTPUT, Options},
    controller::Converter,
    status::{StatusMessage, Tone},
};
use std::{path::PathBuf, process::ExitCode};

#[derive(Parser)]
#[command(version, about, name = "rml2csv")]
/// Recover the CSV rows behind an RML mapping from N-Quads data
struct Args {
    /// RDF file (.nq) produced by the mapping
    #[arg(value_hint = ValueHint::FilePath)]
    quad_file: PathBuf,
    /// RML mapping file (.ttl)
    #[arg(value_hint = ValueHint::FilePath)]
    mapping_file: PathBuf,
    /// Where to write the CSV
    #[arg(short, long, default_value = DEFAULT_OUTPUT, value_hint = ValueHint::FilePath)]
    output: PathBuf,
    /// Base IRI for relative IRIs in the mapping
    #[arg(long, value_hint = ValueHint::Url)]
    base_iri: Option<String>,
    /// Field delimiter, a single ASCII character
    #[arg(short, long, default_value_t = ',', value_parser = parse_delimiter)]
    delimiter: char,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn parse_delimiter(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(format!("'{s}' is not a single ASCII character")),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let mut converter = Converter::new(Options {
        output_path: args.output,
        base_iri: args.base_iri,
        delimiter: args.delimiter as u8,
    });
    let result = converter.on_convert_requested(&args.quad_file, &args.mapping_file);

    let status = StatusMessage::from(&result);
    match status.tone {
        Tone::Success => {
            println!("{}", status.text);
            if let Some(link) = status.link {
                println!("{link}");
            }
            ExitCode::SUCCESS
        }
        Tone::Error => {
            eprintln!("{}", status.text);
            ExitCode::FAILURE
        }
    }
}
