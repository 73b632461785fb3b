//! Error adapter for converting SanitizeError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error type
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # JSON Errors
//!
//! When a [`SanitizeError::Json`] is reported, the failing line and column
//! are turned into a labelled span over the offending source text.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use diagram_sanitize::SanitizeError;

/// Adapter for a JSON syntax error with its source text.
pub struct JsonDiagnosticAdapter<'a> {
    err: &'a serde_json::Error,
    src: &'a str,
}

impl<'a> JsonDiagnosticAdapter<'a> {
    /// Create a new JSON diagnostic adapter.
    pub fn new(err: &'a serde_json::Error, src: &'a str) -> Self {
        Self { err, src }
    }

    fn span(&self) -> SourceSpan {
        let offset = json_error_offset(self.src, self.err.line(), self.err.column());
        let len = usize::from(offset < self.src.len());
        SourceSpan::new(offset.into(), len)
    }
}

impl fmt::Debug for JsonDiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDiagnosticAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for JsonDiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid JSON: {}", self.err)
    }
}

impl std::error::Error for JsonDiagnosticAdapter<'_> {}

impl MietteDiagnostic for JsonDiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("sanitize::json"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("the file must contain a single JSON document"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_primary_with_span(Some("here".to_string()), self.span());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for [`SanitizeError`] variants without source information.
pub struct ErrorAdapter<'a>(pub &'a SanitizeError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            SanitizeError::NotFound(_) => "sanitize::not_found",
            SanitizeError::Io(_) => "sanitize::io",
            SanitizeError::Json { .. } => "sanitize::json",
            SanitizeError::MalformedInput(_) => "sanitize::malformed_input",
            SanitizeError::Config(_) => "sanitize::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            SanitizeError::MalformedInput(_) => Some(Box::new(
                "a diagram is an object with an `elements` array; every element needs string `id` and `type` fields",
            )),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a JSON diagnostic or a plain error, providing a
/// uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A JSON syntax error with source location information.
    Json(JsonDiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Json(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Json(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Json(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Json(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Json(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Json(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`SanitizeError`] into a reportable error.
pub fn to_reportable(err: &SanitizeError) -> Reportable<'_> {
    match err {
        SanitizeError::Json { err, src } => Reportable::Json(JsonDiagnosticAdapter::new(err, src)),
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}

/// Render a [`SanitizeError`] with miette's graphical handler.
pub fn render(err: &SanitizeError) -> String {
    let reporter = miette::GraphicalReportHandler::new();
    let mut writer = String::new();
    if reporter
        .render_report(&mut writer, &to_reportable(err))
        .is_err()
    {
        return err.to_string();
    }
    writer
}

/// Byte offset of a 1-based line and column, clamped to the source length.
fn json_error_offset(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use diagram_sanitize::Document;

    use super::*;

    #[test]
    fn test_json_error_is_diagnostic() {
        let src = "{\n  \"elements\": [\n    {\"id\": }\n  ]\n}";
        let err = Document::parse(src).unwrap_err();

        let reportable = to_reportable(&err);
        match &reportable {
            Reportable::Json(d) => {
                assert!(d.to_string().starts_with("Invalid JSON"));
                let labels: Vec<_> = d.labels().unwrap().collect();
                assert_eq!(labels.len(), 1);
                assert!(labels[0].primary());
                // Points into the third line
                assert!(labels[0].offset() > src.find("{\"id\"").unwrap());
            }
            Reportable::Error(_) => panic!("Expected Json"),
        }
    }

    #[test]
    fn test_not_found_error() {
        let err = SanitizeError::NotFound(PathBuf::from("missing.excalidraw"));

        let reportable = to_reportable(&err);
        match &reportable {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Error: missing.excalidraw not found");
                assert_eq!(e.code().unwrap().to_string(), "sanitize::not_found");
            }
            Reportable::Json(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_malformed_input_has_help() {
        let err = Document::parse(r#"{"elements": [{"type": "text"}]}"#).unwrap_err();

        let reportable = to_reportable(&err);
        assert!(reportable.help().is_some());
        assert_eq!(
            reportable.code().unwrap().to_string(),
            "sanitize::malformed_input"
        );
    }

    #[test]
    fn test_render_contains_message() {
        let err = SanitizeError::Config("bad indent".to_string());
        assert!(render(&err).contains("bad indent"));
    }

    #[test]
    fn test_offset_clamped() {
        assert_eq!(json_error_offset("ab\ncd", 2, 2), 4);
        assert_eq!(json_error_offset("ab", 5, 9), 2);
        assert_eq!(json_error_offset("ab", 1, 0), 0);
    }
}
