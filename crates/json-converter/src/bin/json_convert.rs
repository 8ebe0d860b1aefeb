//! `json-convert`: convert a declarative JSON document.
//!
//! Usage:
//!   json-convert [--config <options.json>] [<document.json>]
//!
//! The document is read from the given file, or from stdin. The converted
//! tree is written to stdout as pretty JSON. Set `RUST_LOG=json_converter=debug`
//! to trace the conversion on stderr.

use clap::Parser;
use json_converter::cli::{convert_document, load_configuration, CliArgs, CliError};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

fn run(args: CliArgs) -> Result<String, CliError> {
    let options = match &args.config {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let configuration = load_configuration(options.as_deref())?;

    let document = match args.document_path() {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    convert_document(&document, configuration)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();
    match run(args) {
        Ok(output) => {
            if let Err(e) = writeln!(io::stdout(), "{output}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
