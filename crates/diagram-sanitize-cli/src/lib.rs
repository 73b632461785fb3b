//! CLI logic for the diagram sanitizer.
//!
//! This module loads a diagram, runs it through the sanitizer and writes the
//! repaired document back to the same path.

pub mod args;
pub mod error_adapter;

mod config;

pub use args::Args;

use std::{
    ffi::OsString,
    fmt, fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use diagram_sanitize::{Document, OriginalIds, SanitizeError, SanitizeStats, Sanitizer};

/// Suffix of the staging file written before the final rename.
pub const EDIT_SUFFIX: &str = ".edit";

/// Outcome of a successful run, printed as the CLI summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Path as given on the command line.
    pub path: String,
    /// Counters from the sanitization pass.
    pub stats: SanitizeStats,
    /// Number of elements written.
    pub element_count: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✓ Sanitized {}", self.path)?;
        writeln!(f, "{}", self.stats)?;
        write!(f, "  Final element count: {}", self.element_count)
    }
}

/// Run the sanitizer CLI application
///
/// The diagram is only written after it has been parsed, validated and
/// sanitized in full.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `SanitizeError` for:
/// - Missing diagram or id files
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid JSON or malformed documents
pub fn run(args: &Args) -> Result<Summary, SanitizeError> {
    info!(
        diagram_path = args.diagram_path,
        remove_icon_text = args.remove_icon_text,
        use_edit_suffix = args.use_edit_suffix;
        "Sanitizing diagram"
    );

    let diagram_path = Path::new(&args.diagram_path);
    if !diagram_path.exists() {
        return Err(SanitizeError::NotFound(diagram_path.to_path_buf()));
    }

    let app_config = config::load_config(args.config.as_ref())?;

    let original_ids = args
        .original_ids_file
        .as_deref()
        .map(load_original_ids)
        .transpose()?;
    if args.remove_icon_text && original_ids.is_none() {
        warn!("--remove-icon-text has no effect without --original-ids-file");
    }

    let source = fs::read_to_string(diagram_path)?;
    let mut document = Document::parse(&source)?;

    let sanitizer = Sanitizer::from(&app_config);
    let stats = document.sanitize_with(&sanitizer, original_ids.as_ref(), args.remove_icon_text);
    let output = document.render(app_config.output())?;

    write_document(diagram_path, &output, args.use_edit_suffix)?;

    info!(
        deprecated_removed = stats.deprecated_removed,
        text_removed = stats.text_removed,
        empty_bound_fixed = stats.empty_bound_fixed;
        "Diagram sanitized"
    );

    Ok(Summary {
        path: args.diagram_path.clone(),
        stats,
        element_count: document.len(),
    })
}

/// Returns the staging path `<path>.edit`.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut staging = OsString::from(path.as_os_str());
    staging.push(EDIT_SUFFIX);
    PathBuf::from(staging)
}

fn load_original_ids(path: &str) -> Result<OriginalIds, SanitizeError> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(SanitizeError::NotFound(path.to_path_buf()));
    }
    debug!(path = path.display().to_string(); "Loading original ids");
    OriginalIds::parse(&fs::read_to_string(path)?)
}

/// Write `contents` to `path`, staging through `<path>.edit` when requested.
fn write_document(path: &Path, contents: &str, use_edit_suffix: bool) -> Result<(), SanitizeError> {
    if !use_edit_suffix {
        fs::write(path, contents)?;
        debug!(path = path.display().to_string(); "Wrote diagram directly");
        return Ok(());
    }

    // Stage next to the real file so a symlinked diagram is repaired through the link
    let target = fs::canonicalize(path)?;
    let staging = staging_path(&target);
    fs::write(&staging, contents)?;
    let renamed = fs::metadata(&target)
        .and_then(|metadata| fs::set_permissions(&staging, metadata.permissions()))
        .and_then(|()| fs::rename(&staging, &target));
    if let Err(err) = renamed {
        if let Err(cleanup) = fs::remove_file(&staging) {
            debug!(path = staging.display().to_string(), err:% = cleanup; "Failed to remove staging file");
        }
        return Err(err.into());
    }
    debug!(staging = staging.display().to_string(); "Wrote diagram through staging file");

    Ok(())
}
