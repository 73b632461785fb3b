//! Configuration types for diagram sanitization.
//!
//! This module provides configuration structures that control which element
//! properties are stripped and how the repaired document is written. All
//! types implement [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining sanitize and output settings.
//! - [`SanitizeRules`] - The property names the sanitizer removes.
//! - [`OutputConfig`] - Controls how the document is serialized.
//!
//! # Example
//!
//! ```
//! # use diagram_sanitize::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert_eq!(config.output().indent(), 2);
//! assert!(config.sanitize().is_deprecated("strokeSharpness"));
//! ```

use serde::Deserialize;

/// Properties older exports carry that current versions reject on any element.
pub const DEPRECATED_PROPERTIES: [&str; 2] = ["strokeSharpness", "baseline"];

/// Arrowhead properties that are only valid on `arrow` elements.
pub const LINE_ONLY_PROPERTIES: [&str; 2] = ["startArrowhead", "endArrowhead"];

/// Top-level configuration combining sanitize and output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Sanitize rules section.
    #[serde(default)]
    sanitize: SanitizeRules,

    /// Output configuration section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified rules and output settings.
    ///
    /// # Arguments
    ///
    /// * `sanitize` - Property names to strip.
    /// * `output` - Serialization options for the repaired document.
    pub fn new(sanitize: SanitizeRules, output: OutputConfig) -> Self {
        Self { sanitize, output }
    }

    /// Returns the sanitize rules.
    pub fn sanitize(&self) -> &SanitizeRules {
        &self.sanitize
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }
}

/// The property names removed by the sanitizer.
///
/// Fields left out of a configuration file fall back to
/// [`DEPRECATED_PROPERTIES`] and [`LINE_ONLY_PROPERTIES`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SanitizeRules {
    /// Removed from every element.
    #[serde(default = "default_deprecated_properties")]
    deprecated_properties: Vec<String>,

    /// Removed from `line` elements only.
    #[serde(default = "default_line_only_properties")]
    line_only_properties: Vec<String>,
}

impl Default for SanitizeRules {
    fn default() -> Self {
        Self {
            deprecated_properties: default_deprecated_properties(),
            line_only_properties: default_line_only_properties(),
        }
    }
}

impl SanitizeRules {
    /// Creates a new [`SanitizeRules`] from explicit property lists.
    ///
    /// # Arguments
    ///
    /// * `deprecated_properties` - Properties stripped from every element.
    /// * `line_only_properties` - Properties stripped from `line` elements.
    pub fn new(deprecated_properties: Vec<String>, line_only_properties: Vec<String>) -> Self {
        Self {
            deprecated_properties,
            line_only_properties,
        }
    }

    /// Returns the properties stripped from every element.
    pub fn deprecated_properties(&self) -> &[String] {
        &self.deprecated_properties
    }

    /// Returns the properties stripped from `line` elements.
    pub fn line_only_properties(&self) -> &[String] {
        &self.line_only_properties
    }

    /// Returns `true` if `property` is stripped from every element.
    pub fn is_deprecated(&self, property: &str) -> bool {
        self.deprecated_properties.iter().any(|p| p == property)
    }
}

/// Serialization options for the repaired document.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Number of spaces per indentation level.
    #[serde(default = "default_indent")]
    indent: usize,

    /// Write non-ASCII characters as `\uXXXX` escapes.
    #[serde(default = "default_ensure_ascii")]
    ensure_ascii: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(default_indent())
    }
}

impl OutputConfig {
    /// Creates a new [`OutputConfig`] with the given indentation width.
    ///
    /// Non-ASCII characters are escaped unless
    /// [`OutputConfig::with_ensure_ascii`] turns it off.
    pub fn new(indent: usize) -> Self {
        Self {
            indent,
            ensure_ascii: default_ensure_ascii(),
        }
    }

    /// Sets whether non-ASCII characters are escaped.
    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    /// Returns the number of spaces per indentation level.
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Returns `true` if non-ASCII characters are written as escapes.
    pub fn ensure_ascii(&self) -> bool {
        self.ensure_ascii
    }
}

fn default_deprecated_properties() -> Vec<String> {
    DEPRECATED_PROPERTIES.iter().map(|p| p.to_string()).collect()
}

fn default_line_only_properties() -> Vec<String> {
    LINE_ONLY_PROPERTIES.iter().map(|p| p.to_string()).collect()
}

fn default_indent() -> usize {
    2
}

fn default_ensure_ascii() -> bool {
    true
}
