//! Command-line front end of `json-convert`.
//!
//! Provides the logic behind the binary entry point so it can be tested
//! without spawning a process. The binary converts one document with the
//! accessor resolver enabled and an optional declarative configuration.

use crate::accessor::accessor_resolver;
use crate::configuration::{Configuration, ConverterOptions};
use crate::converter::JsonConverter;
use crate::error::ConvertError;
use clap::Parser;
use std::path::{Path, PathBuf};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Convert(ConvertError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e)      => write!(f, "{e}"),
            CliError::Json(e)    => write!(f, "{e}"),
            CliError::Convert(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self { CliError::Io(e) }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self { CliError::Json(e) }
}

impl From<ConvertError> for CliError {
    fn from(e: ConvertError) -> Self { CliError::Convert(e) }
}

// ── Arguments ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Parser)]
#[command(
    name = "json-convert",
    version,
    about = "Convert a declarative JSON document, resolving @@= and @@# tags",
    after_help = "Set RUST_LOG=json_converter=debug to trace the conversion on stderr."
)]
pub struct CliArgs {
    /// Declarative configuration file (typeKey, constants, enumerations, ...).
    #[arg(short, long, value_name = "OPTIONS_JSON")]
    pub config: Option<PathBuf>,
    /// Document file; stdin when absent or `-`.
    #[arg(value_name = "DOCUMENT_JSON")]
    pub document: Option<PathBuf>,
}

impl CliArgs {
    /// The document file to read, `None` meaning stdin.
    pub fn document_path(&self) -> Option<&Path> {
        self.document.as_deref().filter(|path| *path != Path::new("-"))
    }
}

// ── Conversion ────────────────────────────────────────────────────────────

/// Builds the configuration used by the binary from optional options JSON.
pub fn load_configuration(options_json: Option<&str>) -> Result<Configuration, CliError> {
    let options: ConverterOptions = match options_json {
        Some(text) => serde_json::from_str(text)?,
        None => ConverterOptions::default(),
    };
    Ok(Configuration::from_options(options)?.with_convert_function(accessor_resolver()))
}

/// Converts a JSON document and renders the result as pretty JSON.
///
/// Instances are written under the configured type key. An empty document
/// renders as `null`.
pub fn convert_document(document: &str, configuration: Configuration) -> Result<String, CliError> {
    let mut converter = JsonConverter::with_configuration(configuration);
    match converter.convert(document.trim())? {
        Some(converted) => {
            let type_key = converter.configuration().type_key.as_str();
            Ok(serde_json::to_string_pretty(&converted.with_type_key(type_key))?)
        }
        None => Ok("null".to_string()),
    }
}
