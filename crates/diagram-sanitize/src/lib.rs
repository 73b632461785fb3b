//! Diagram Sanitize - repair Excalidraw diagrams after icon libraries are merged in.
//!
//! Icon libraries from excalidraw.com carry element properties that newer
//! Excalidraw releases reject. This crate parses a diagram into a
//! [`Document`], strips those properties with a [`Sanitizer`], and optionally
//! removes the text labels icon libraries attach to their shapes.
//!
//! # Examples
//!
//! ```rust
//! use diagram_sanitize::{Document, OriginalIds, Sanitizer};
//!
//! let source = r#"{
//!   "type": "excalidraw",
//!   "elements": [
//!     {"id": "a1", "type": "line", "strokeSharpness": "sharp", "endArrowhead": "arrow"},
//!     {"id": "icon1", "type": "text"}
//!   ]
//! }"#;
//!
//! let mut document = Document::parse(source).expect("Failed to parse");
//! let original_ids = OriginalIds::from_iter(["a1"]);
//!
//! let stats = document.sanitize_with(&Sanitizer::default(), Some(&original_ids), true);
//! assert_eq!(stats.deprecated_removed, 2);
//! assert_eq!(stats.text_removed, 1);
//! assert_eq!(document.len(), 1);
//!
//! let repaired = document.to_json_string(2).expect("Failed to render");
//! assert!(!repaired.contains("strokeSharpness"));
//! ```

pub mod config;
pub mod document;

mod error;
mod original_ids;
mod sanitize;

pub use document::{Document, Element, ElementKind};
pub use error::SanitizeError;
pub use original_ids::OriginalIds;
pub use sanitize::{SanitizeStats, Sanitizer, sanitize};

use config::AppConfig;

impl From<&AppConfig> for Sanitizer {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.sanitize().clone())
    }
}
