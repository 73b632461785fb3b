//! Command-line argument definitions for the diagram sanitizer.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`], and maps clap's parse failures onto the messages the tool
//! prints for bad invocations.

use std::ffi::OsString;

use clap::{
    ArgAction, Parser,
    error::{ContextKind, ContextValue, ErrorKind},
};
use thiserror::Error;

/// Usage text printed when no diagram path is given.
pub const USAGE: &str = "\
Usage: sanitize-diagram <diagram_path> [OPTIONS]

Options:
  --remove-icon-text         Remove icon library text labels
  --original-ids-file PATH   JSON file with original element IDs
  --no-use-edit-suffix       Write directly to file
  --config PATH              TOML configuration file
  --log-level LEVEL          Log level (off, error, warn, info, debug, trace)";

/// Command-line arguments for the diagram sanitizer
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sanitize-diagram",
    author,
    version,
    about,
    long_about = None,
    args_override_self = true
)]
pub struct Args {
    /// Path to the Excalidraw diagram, rewritten in place
    #[arg(help = "Path to the diagram file")]
    pub diagram_path: String,

    /// Remove text elements added by icon libraries
    #[arg(long)]
    pub remove_icon_text: bool,

    /// JSON file listing the original diagram element IDs
    #[arg(long, value_name = "PATH")]
    pub original_ids_file: Option<String>,

    /// Write directly to the file instead of staging through `<path>.edit`
    #[arg(long = "no-use-edit-suffix", action = ArgAction::SetFalse)]
    pub use_edit_suffix: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Errors produced while parsing the command line.
#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("{}", USAGE)]
    MissingPath,

    #[error("{0}")]
    Invalid(String),

    /// `--help` or `--version`; clap prints these itself.
    #[error("{0}")]
    Display(clap::Error),
}

impl From<clap::Error> for ArgsError {
    fn from(err: clap::Error) -> Self {
        match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => Self::Display(err),
            ErrorKind::UnknownArgument => match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(token)) => Self::UnknownOption(token.clone()),
                _ => Self::Invalid(err.to_string()),
            },
            ErrorKind::MissingRequiredArgument => Self::MissingPath,
            _ => Self::Invalid(err.to_string()),
        }
    }
}

/// Parse arguments from an iterator, the first item being the program name.
///
/// # Errors
///
/// Returns [`ArgsError`] when the arguments do not form a valid invocation.
pub fn parse_from<I, T>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::try_parse_from(args).map_err(ArgsError::from)
}
